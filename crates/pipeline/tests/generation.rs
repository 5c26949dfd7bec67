//! Full pipeline runs against real working directories.

use std::path::PathBuf;
use std::sync::Arc;

use specforge_codegen::archive::zip_dir;
use specforge_codegen::deps::NoLookup;
use specforge_core::spec::parser::parse_spec;
use specforge_pipeline::context::GenerationContext;
use specforge_pipeline::machine::{PipelineMachine, PipelineOutcome};
use specforge_pipeline::stages::standard_registry;

async fn run_pipeline(spec_text: &str, work_dir: PathBuf) -> (PipelineOutcome, GenerationContext) {
    let spec = parse_spec(spec_text).unwrap();
    let mut ctx = GenerationContext::new(work_dir, spec);
    let registry = standard_registry(Arc::new(NoLookup)).unwrap();
    let mut machine = PipelineMachine::new(registry);
    let outcome = machine.start(&mut ctx).await.unwrap();
    (outcome, ctx)
}

fn read(ctx: &GenerationContext, relative: &str) -> String {
    std::fs::read_to_string(ctx.work_dir.join(relative))
        .unwrap_or_else(|e| panic!("missing {relative}: {e}"))
}

const TWO_MODELS: &str = "\
app:
  groupId: com.acme
  artifactId: shop
  version: 1.0.0
models:
- name: Customer
  fields:
  - name: email
    type: String
    constraints:
    - {name: Email}
- name: Invoice
  fields:
  - name: total
    type: Decimal
";

#[tokio::test]
async fn valid_spec_reaches_done_with_one_source_file_per_model() {
    let dir = tempfile::tempdir().unwrap();
    let (outcome, ctx) = run_pipeline(TWO_MODELS, dir.path().to_path_buf()).await;

    assert_eq!(outcome, PipelineOutcome::Done);
    assert!(ctx.error.is_none());
    read(&ctx, "src/main/java/com/acme/shop/model/Customer.java");
    read(&ctx, "src/main/java/com/acme/shop/model/Invoice.java");

    let archive = zip_dir(&ctx.work_dir).unwrap();
    assert!(!archive.is_empty());
}

#[tokio::test]
async fn order_scenario_produces_identity_id_and_not_null_decimal() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = r#"{app: {groupId: "com.x", artifactId: "demo", version: "0.0.1"}, models: [{name: "Order", id: {field: "id", type: "Long", generation: {strategy: "IDENTITY"}}, fields: [{name: "total", type: "Decimal", constraints: [{name: "NotNull"}]}]}]}"#;
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);

    let order = read(&ctx, "src/main/java/com/x/demo/model/Order.java");
    assert!(order.contains("@GeneratedValue(strategy = GenerationType.IDENTITY)"));
    assert!(order.contains("private Long id;"));
    assert!(order.contains("@NotNull"));
    assert!(order.contains("private BigDecimal total;"));

    let pom = read(&ctx, "pom.xml");
    assert!(pom.contains("<groupId>com.x</groupId>"));
    assert!(pom.contains("<artifactId>demo</artifactId>"));
    assert!(pom.contains("<version>0.0.1</version>"));

    let archive = zip_dir(&ctx.work_dir).unwrap();
    assert!(!archive.is_empty());
}

#[tokio::test]
async fn compiling_the_same_spec_twice_is_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let (_, ctx_a) = run_pipeline(TWO_MODELS, first.path().to_path_buf()).await;
    let (_, ctx_b) = run_pipeline(TWO_MODELS, second.path().to_path_buf()).await;

    let zip_a = zip_dir(&ctx_a.work_dir).unwrap();
    let zip_b = zip_dir(&ctx_b.work_dir).unwrap();
    assert_eq!(zip_a, zip_b);
}

#[tokio::test]
async fn one_to_many_generates_collection_and_back_reference() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = "\
app:
  groupId: com.acme
  artifactId: shop
models:
- name: Customer
  relations:
  - {name: orders, cardinality: '1:N', target: Order, mappedBy: customer}
- name: Order
  relations:
  - {name: customer, cardinality: 'N:1', target: Customer}
";
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);

    let customer = read(&ctx, "src/main/java/com/acme/shop/model/Customer.java");
    assert!(customer.contains("@OneToMany(mappedBy = \"customer\")"));
    assert!(customer.contains("private Set<Order> orders"));

    let order = read(&ctx, "src/main/java/com/acme/shop/model/Order.java");
    assert!(order.contains("private Customer customer;"));
}

#[tokio::test]
async fn one_to_many_without_inverse_name_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = "\
app:
  groupId: com.acme
  artifactId: shop
models:
- name: Customer
  relations:
  - {name: orders, cardinality: '1:N', target: Order}
- name: Order
";
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;

    assert_eq!(outcome, PipelineOutcome::Error);
    let error = ctx.error.unwrap();
    assert!(error.contains("orders"), "unexpected error: {error}");
    assert!(error.contains("inverse"), "unexpected error: {error}");
}

#[tokio::test]
async fn rest_models_get_repository_service_and_controller() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = "\
app:
  groupId: com.acme
  artifactId: shop
models:
- name: Customer
  rest: true
";
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);

    read(&ctx, "src/main/java/com/acme/shop/repository/CustomerRepository.java");
    read(&ctx, "src/main/java/com/acme/shop/service/CustomerService.java");
    let controller = read(&ctx, "src/main/java/com/acme/shop/controller/CustomerController.java");
    assert!(controller.contains("/api/customers"));
    read(&ctx, "src/main/java/com/acme/shop/util/NotFoundException.java");
}

#[tokio::test]
async fn app_files_include_merged_catalog_and_actuator_properties() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = "\
app:
  groupId: com.acme
  artifactId: shop
models:
- name: Customer
  fields:
  - name: email
    type: String
    constraints:
    - {name: NotNull}
";
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);

    let properties = read(&ctx, "src/main/resources/application.properties");
    assert!(properties.contains("spring.application.name=shop"));
    assert!(properties.contains("management.endpoints.web.exposure.include"));

    let messages = read(&ctx, "src/main/resources/messages.properties");
    assert!(messages.contains("must not be null"));

    read(&ctx, "README.md");
    read(&ctx, ".gitignore");
    read(&ctx, "src/main/resources/application-local.properties");
    read(&ctx, "src/main/resources/application-production.properties");
}

#[tokio::test]
async fn compose_file_written_only_when_requested() {
    let with_compose = "\
app:
  groupId: com.acme
  artifactId: shop
database: postgres
features:
  compose: true
models:
- name: Customer
";
    let dir = tempfile::tempdir().unwrap();
    let (outcome, ctx) = run_pipeline(with_compose, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);
    let compose = read(&ctx, "compose.yaml");
    assert!(compose.contains("postgres:17"));

    let dir = tempfile::tempdir().unwrap();
    let (_, ctx) = run_pipeline(TWO_MODELS, dir.path().to_path_buf()).await;
    assert!(!ctx.work_dir.join("compose.yaml").exists());
}

#[tokio::test]
async fn openapi_feature_adds_config_class_and_starter() {
    let dir = tempfile::tempdir().unwrap();
    let spec_text = "\
app:
  groupId: com.acme
  artifactId: shop
features:
  openapi: true
models:
- name: Customer
";
    let (outcome, ctx) = run_pipeline(spec_text, dir.path().to_path_buf()).await;
    assert_eq!(outcome, PipelineOutcome::Done);
    assert!(ctx.flag("openapi"));

    read(&ctx, "src/main/java/com/acme/shop/config/OpenApiConfig.java");
    let pom = read(&ctx, "pom.xml");
    assert!(pom.contains("springdoc-openapi-starter-webmvc-ui"));
}
