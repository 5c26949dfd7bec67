//! Application-level files: the main class, runtime configuration
//! properties, the merged message catalog, README, `.gitignore`, and the
//! optional container-compose file.

use specforge_core::spec::{ApplicationSpec, BuildTool, Datastore};

use crate::buildfile::application_class;
use crate::unit::{template_candidates, CompileOptions, GenerationUnit};

/// The Spring Boot application class, in the base package.
pub fn application_unit(spec: &ApplicationSpec, options: &CompileOptions) -> GenerationUnit {
    let mut unit = GenerationUnit::new(
        spec.base_package.clone(),
        application_class(spec),
        template_candidates(options.language, "application"),
    );
    unit.add_import("org.springframework.boot.autoconfigure.SpringBootApplication");
    match options.language {
        specforge_core::spec::TargetLanguage::Java => {
            unit.add_import("org.springframework.boot.SpringApplication");
        }
        specforge_core::spec::TargetLanguage::Kotlin => {
            unit.add_import("org.springframework.boot.runApplication");
        }
    }
    unit
}

/// Default datasource URL for the local development profile.
fn jdbc_url(spec: &ApplicationSpec) -> Option<String> {
    let database = &spec.app.artifact;
    match spec.datastore {
        Datastore::Postgres => Some(format!("jdbc:postgresql://localhost:5432/{database}")),
        Datastore::Mysql => Some(format!("jdbc:mysql://localhost:3306/{database}")),
        Datastore::Mariadb => Some(format!("jdbc:mariadb://localhost:3306/{database}")),
        Datastore::Mssql => Some(format!(
            "jdbc:sqlserver://localhost:1433;databaseName={database};encrypt=false"
        )),
        Datastore::H2 => Some(format!("jdbc:h2:mem:{database}")),
        Datastore::None | Datastore::Mongodb => None,
    }
}

/// Render `application.properties`. Management endpoint exposure is added
/// when the run produced the runtime-config artifacts.
pub fn application_properties(spec: &ApplicationSpec, actuator: bool) -> String {
    let mut lines = vec![format!("spring.application.name={}", spec.app.name)];

    if let Some(url) = jdbc_url(spec) {
        lines.push(format!("spring.datasource.url=${{JDBC_DATABASE_URL:{url}}}"));
        lines.push("spring.datasource.username=${JDBC_DATABASE_USERNAME:}".to_string());
        lines.push("spring.datasource.password=${JDBC_DATABASE_PASSWORD:}".to_string());
        lines.push("spring.jpa.hibernate.ddl-auto=update".to_string());
        lines.push("spring.jpa.open-in-view=false".to_string());
    }
    if spec.datastore == Datastore::Mongodb {
        lines.push(format!(
            "spring.data.mongodb.uri=${{MONGODB_URI:mongodb://localhost:27017/{}}}",
            spec.app.artifact
        ));
    }
    if actuator {
        lines.push("management.endpoints.web.exposure.include=health,info,metrics".to_string());
        lines.push("management.endpoint.health.show-details=when-authorized".to_string());
    }
    if spec.openapi {
        lines.push("springdoc.swagger-ui.path=/swagger-ui.html".to_string());
    }

    lines.join("\n") + "\n"
}

/// Per-profile property variants.
pub fn profile_properties(spec: &ApplicationSpec) -> Vec<(String, String)> {
    let mut local = vec!["spring.jpa.properties.hibernate.format_sql=true".to_string()];
    if spec.datastore != Datastore::None && spec.datastore != Datastore::Mongodb {
        local.push("spring.jpa.show-sql=true".to_string());
    }

    let production = vec!["spring.jpa.hibernate.ddl-auto=validate".to_string()];

    vec![
        (
            "src/main/resources/application-local.properties".to_string(),
            local.join("\n") + "\n",
        ),
        (
            "src/main/resources/application-production.properties".to_string(),
            production.join("\n") + "\n",
        ),
    ]
}

/// Merge all message-catalog fragments into `messages.properties`: sorted
/// by key, first fragment wins on duplicates.
pub fn messages_properties(messages: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = messages.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted.dedup_by(|a, b| a.0 == b.0);

    let mut out = String::new();
    for (key, text) in sorted {
        out.push_str(key);
        out.push('=');
        out.push_str(text);
        out.push('\n');
    }
    out
}

pub fn readme(spec: &ApplicationSpec) -> String {
    let run_command = match spec.app.build_tool {
        BuildTool::Maven => "./mvnw spring-boot:run",
        BuildTool::Gradle | BuildTool::GradleKotlin => "./gradlew bootRun",
    };
    let build_command = match spec.app.build_tool {
        BuildTool::Maven => "./mvnw clean package",
        BuildTool::Gradle | BuildTool::GradleKotlin => "./gradlew clean build",
    };

    format!(
        "# {name}\n\n{description}\n\n\
         ## Development\n\n\
         Start the application with the `local` profile:\n\n\
         ```\n{run_command}\n```\n\n\
         ## Build\n\n\
         ```\n{build_command}\n```\n",
        name = spec.app.name,
        description = if spec.app.description.is_empty() {
            "Generated Spring Boot application.".to_string()
        } else {
            spec.app.description.clone()
        },
    )
}

pub fn gitignore() -> String {
    "target/\nbuild/\n.gradle/\n*.class\n*.log\n.idea/\n*.iml\n.vscode/\n.DS_Store\n".to_string()
}

/// Container-compose file for the selected datastore, when one is needed.
pub fn compose_file(spec: &ApplicationSpec) -> Option<String> {
    let database = &spec.app.artifact;
    let service = match spec.datastore {
        Datastore::Postgres => format!(
            "  postgres:\n\
             \x20   image: postgres:17\n\
             \x20   environment:\n\
             \x20     POSTGRES_DB: {database}\n\
             \x20     POSTGRES_USER: {database}\n\
             \x20     POSTGRES_PASSWORD: {database}\n\
             \x20   ports:\n\
             \x20     - 5432:5432\n"
        ),
        Datastore::Mysql => format!(
            "  mysql:\n\
             \x20   image: mysql:9\n\
             \x20   environment:\n\
             \x20     MYSQL_DATABASE: {database}\n\
             \x20     MYSQL_ROOT_PASSWORD: {database}\n\
             \x20   ports:\n\
             \x20     - 3306:3306\n"
        ),
        Datastore::Mariadb => format!(
            "  mariadb:\n\
             \x20   image: mariadb:11\n\
             \x20   environment:\n\
             \x20     MARIADB_DATABASE: {database}\n\
             \x20     MARIADB_ROOT_PASSWORD: {database}\n\
             \x20   ports:\n\
             \x20     - 3306:3306\n"
        ),
        Datastore::Mssql => format!(
            "  mssql:\n\
             \x20   image: mcr.microsoft.com/mssql/server:2022-latest\n\
             \x20   environment:\n\
             \x20     ACCEPT_EULA: Y\n\
             \x20     MSSQL_SA_PASSWORD: {database}A1!\n\
             \x20   ports:\n\
             \x20     - 1433:1433\n"
        ),
        Datastore::Mongodb => format!(
            "  mongodb:\n\
             \x20   image: mongo:8\n\
             \x20   environment:\n\
             \x20     MONGO_INITDB_DATABASE: {database}\n\
             \x20   ports:\n\
             \x20     - 27017:27017\n"
        ),
        Datastore::None | Datastore::H2 => return None,
    };

    Some(format!("services:\n{service}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use specforge_core::spec::parser::parse_spec;

    fn spec(text: &str) -> ApplicationSpec {
        parse_spec(text).unwrap()
    }

    #[test]
    fn application_class_name_follows_artifact() {
        let spec = spec("app: {artifactId: order-service}\n");
        let options = CompileOptions::from_spec(&spec);
        let unit = application_unit(&spec, &options);
        assert_eq!(unit.class_name, "OrderServiceApplication");
        assert_eq!(unit.package, "com.example.orderservice");
    }

    #[test]
    fn postgres_properties_include_datasource() {
        let spec = spec("app: {artifactId: demo}\ndatabase: postgres\n");
        let properties = application_properties(&spec, false);
        assert!(properties.contains("jdbc:postgresql://localhost:5432/demo"));
        assert!(properties.contains("spring.jpa.open-in-view=false"));
        assert!(!properties.contains("management.endpoints"));
    }

    #[test]
    fn actuator_flag_adds_management_exposure() {
        let spec = spec("app: {artifactId: demo}\n");
        let properties = application_properties(&spec, true);
        assert!(properties.contains("management.endpoints.web.exposure.include"));
    }

    #[test]
    fn mongodb_uses_uri_instead_of_datasource() {
        let spec = spec("app: {artifactId: demo}\ndatabase: mongodb\n");
        let properties = application_properties(&spec, false);
        assert!(properties.contains("spring.data.mongodb.uri"));
        assert!(!properties.contains("spring.datasource.url"));
    }

    #[test]
    fn messages_are_sorted_and_deduplicated() {
        let messages = vec![
            ("b.key".to_string(), "second".to_string()),
            ("a.key".to_string(), "first".to_string()),
            ("b.key".to_string(), "ignored duplicate".to_string()),
        ];
        assert_eq!(
            messages_properties(&messages),
            "a.key=first\nb.key=second\n"
        );
    }

    #[test]
    fn compose_only_for_server_datastores() {
        assert!(compose_file(&spec("app: {}\ndatabase: postgres\n")).is_some());
        assert!(compose_file(&spec("app: {}\ndatabase: h2\n")).is_none());
        assert!(compose_file(&spec("app: {}\n")).is_none());
        let mongo = compose_file(&spec("app: {artifactId: demo}\ndatabase: mongodb\n")).unwrap();
        assert!(mongo.contains("image: mongo:8"));
    }

    #[test]
    fn readme_mentions_the_wrapper_command() {
        let maven = readme(&spec("app: {name: Demo}\n"));
        assert!(maven.contains("./mvnw spring-boot:run"));
        let gradle = readme(&spec("app: {buildTool: gradle}\n"));
        assert!(gradle.contains("./gradlew bootRun"));
    }
}
