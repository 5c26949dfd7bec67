//! REST resource compiler.
//!
//! For each REST-exposed entity this derives the plural kebab-case endpoint
//! path, the id type, and the repository/service/controller artifacts in
//! their layout-dependent packages. A shared support-utilities artifact
//! (`NotFoundException`) is generated once per run.

use specforge_core::casing::{pluralize, to_kebab, to_lower_camel, to_lower_snake, to_upper_camel};
use specforge_core::spec::{ApplicationSpec, EntitySpec, TargetLanguage};

use crate::error::CodegenError;
use crate::packages::{package_for, ArtifactKind};
use crate::types::resolve;
use crate::unit::{template_candidates, CompileOptions, GenerationUnit};

pub struct RestResourceCompiler;

impl RestResourceCompiler {
    /// Compile the repository, service and controller units for one entity.
    pub fn compile(
        entity: &EntitySpec,
        options: &CompileOptions,
    ) -> Result<Vec<GenerationUnit>, CodegenError> {
        let entity_type = to_upper_camel(&entity.name);
        let id = resolve(&entity.id.type_token, options.language);

        let model_package = package_for(
            &options.base_package,
            options.layout,
            ArtifactKind::Model,
            Some(&entity.name),
        );
        let entity_import = format!("{model_package}.{entity_type}");

        let repository = repository_unit(entity, options, &entity_type, &id.name, &entity_import)?;
        let service = service_unit(entity, options, &entity_type, &id, &entity_import, &repository)?;
        let controller = controller_unit(entity, options, &entity_type, &id, &entity_import, &service)?;

        Ok(vec![repository, service, controller])
    }
}

/// Plural kebab-case endpoint path for an entity.
pub fn base_path(entity_name: &str) -> String {
    format!("/api/{}", pluralize(&to_kebab(entity_name)))
}

fn repository_unit(
    entity: &EntitySpec,
    options: &CompileOptions,
    entity_type: &str,
    id_type: &str,
    entity_import: &str,
) -> Result<GenerationUnit, CodegenError> {
    let package = package_for(
        &options.base_package,
        options.layout,
        ArtifactKind::Repository,
        Some(&entity.name),
    );
    let mut unit = GenerationUnit::new(
        package,
        format!("{entity_type}Repository"),
        template_candidates(options.language, "repository"),
    );

    if options.datastore.is_document() {
        unit.set("baseInterface", "MongoRepository".into());
        unit.add_import("org.springframework.data.mongodb.repository.MongoRepository");
    } else {
        unit.set("baseInterface", "JpaRepository".into());
        unit.add_import("org.springframework.data.jpa.repository.JpaRepository");
    }
    unit.set("entityType", entity_type.into());
    unit.set("idType", id_type.into());
    unit.add_import(entity_import.to_string());
    unit.add_imports(resolve(&entity.id.type_token, options.language).imports);
    Ok(unit)
}

fn service_unit(
    entity: &EntitySpec,
    options: &CompileOptions,
    entity_type: &str,
    id: &crate::types::ResolvedType,
    entity_import: &str,
    repository: &GenerationUnit,
) -> Result<GenerationUnit, CodegenError> {
    let package = package_for(
        &options.base_package,
        options.layout,
        ArtifactKind::Service,
        Some(&entity.name),
    );
    let mut unit = GenerationUnit::new(
        package,
        format!("{entity_type}Service"),
        template_candidates(options.language, "service"),
    );

    unit.set("entityType", entity_type.into());
    unit.set("entityField", to_lower_camel(&entity.name).into());
    unit.set("idType", id.name.clone().into());
    unit.set("idPascal", to_upper_camel(&entity.id.field).into());
    unit.set("idField", to_lower_camel(&entity.id.field).into());
    unit.set("repositoryType", repository.class_name.clone().into());
    unit.set(
        "repositoryField",
        to_lower_camel(&repository.class_name).into(),
    );

    unit.add_import("org.springframework.stereotype.Service");
    if options.language == TargetLanguage::Java {
        unit.add_import("java.util.List");
    }
    unit.add_import(entity_import.to_string());
    unit.add_imports(id.imports.clone());
    if repository.package != unit.package {
        unit.add_import(format!("{}.{}", repository.package, repository.class_name));
    }
    unit.add_import(format!("{}.util.NotFoundException", options.base_package));
    Ok(unit)
}

fn controller_unit(
    entity: &EntitySpec,
    options: &CompileOptions,
    entity_type: &str,
    id: &crate::types::ResolvedType,
    entity_import: &str,
    service: &GenerationUnit,
) -> Result<GenerationUnit, CodegenError> {
    let package = package_for(
        &options.base_package,
        options.layout,
        ArtifactKind::Controller,
        Some(&entity.name),
    );
    let mut unit = GenerationUnit::new(
        package,
        format!("{entity_type}Controller"),
        template_candidates(options.language, "controller"),
    );

    unit.set("entityType", entity_type.into());
    unit.set("entityField", to_lower_camel(&entity.name).into());
    unit.set("idType", id.name.clone().into());
    unit.set("basePath", base_path(&entity.name).into());
    unit.set(
        "plural",
        to_upper_camel(&pluralize(&to_lower_snake(&entity.name))).into(),
    );
    unit.set("serviceType", service.class_name.clone().into());
    unit.set("serviceField", to_lower_camel(&service.class_name).into());

    for import in [
        "org.springframework.http.HttpStatus",
        "org.springframework.http.MediaType",
        "org.springframework.http.ResponseEntity",
        "org.springframework.web.bind.annotation.DeleteMapping",
        "org.springframework.web.bind.annotation.GetMapping",
        "org.springframework.web.bind.annotation.PathVariable",
        "org.springframework.web.bind.annotation.PostMapping",
        "org.springframework.web.bind.annotation.PutMapping",
        "org.springframework.web.bind.annotation.RequestBody",
        "org.springframework.web.bind.annotation.RequestMapping",
        "org.springframework.web.bind.annotation.RestController",
        "jakarta.validation.Valid",
    ] {
        unit.add_import(import);
    }
    if options.language == TargetLanguage::Java {
        unit.add_import("java.util.List");
    }
    unit.add_import(entity_import.to_string());
    unit.add_imports(id.imports.clone());
    if service.package != unit.package {
        unit.add_import(format!("{}.{}", service.package, service.class_name));
    }
    Ok(unit)
}

/// The OpenAPI documentation config artifact, generated when the spec's
/// `openapi` feature flag is set.
pub fn openapi_config_unit(spec: &ApplicationSpec, options: &CompileOptions) -> GenerationUnit {
    let mut unit = GenerationUnit::new(
        format!("{}.config", options.base_package),
        "OpenApiConfig",
        template_candidates(options.language, "openapi_config"),
    );
    unit.set("title", spec.app.name.clone().into());
    unit.set("version", spec.app.version.clone().into());
    unit.add_import("io.swagger.v3.oas.models.OpenAPI");
    unit.add_import("io.swagger.v3.oas.models.info.Info");
    unit.add_import("org.springframework.context.annotation.Bean");
    unit.add_import("org.springframework.context.annotation.Configuration");
    unit
}

/// The shared support-utilities artifact, generated once per run.
pub fn support_unit(options: &CompileOptions) -> GenerationUnit {
    let mut unit = GenerationUnit::new(
        format!("{}.util", options.base_package),
        "NotFoundException",
        template_candidates(options.language, "not_found_exception"),
    );
    unit.add_import("org.springframework.http.HttpStatus");
    unit.add_import("org.springframework.web.server.ResponseStatusException");
    unit
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use specforge_core::spec::parser::parse_spec;
    use specforge_core::spec::ApplicationSpec;

    fn spec(text: &str) -> ApplicationSpec {
        parse_spec(text).unwrap()
    }

    #[test]
    fn endpoint_path_is_plural_kebab() {
        assert_eq!(base_path("OrderLine"), "/api/order-lines");
        assert_eq!(base_path("Category"), "/api/categories");
        assert_eq!(base_path("DeliveryPerson"), "/api/delivery-people");
    }

    #[test]
    fn technical_layout_produces_three_layered_units() {
        let spec = spec("app: {}\nmodels:\n- name: Order\n  rest: true\n");
        let options = CompileOptions::from_spec(&spec);
        let units = RestResourceCompiler::compile(&spec.entities[0], &options).unwrap();

        assert_eq!(units[0].package, "com.example.app.repository");
        assert_eq!(units[0].class_name, "OrderRepository");
        assert_eq!(units[1].package, "com.example.app.service");
        assert_eq!(units[1].class_name, "OrderService");
        assert_eq!(units[2].package, "com.example.app.controller");
        assert_eq!(units[2].class_name, "OrderController");
        assert_eq!(units[2].model["basePath"], "/api/orders");
    }

    #[test]
    fn domain_layout_scopes_packages_per_entity() {
        let spec = spec("app: {}\nlayout: domain\nmodels:\n- name: OrderLine\n  rest: true\n");
        let options = CompileOptions::from_spec(&spec);
        let units = RestResourceCompiler::compile(&spec.entities[0], &options).unwrap();

        assert_eq!(units[0].package, "com.example.app.domain.order_line.repository");
        assert_eq!(units[1].package, "com.example.app.domain.order_line.service");
        assert_eq!(units[2].package, "com.example.app.domain.order_line.controller");
        // The service imports the entity from its domain model package.
        assert!(units[1]
            .imports
            .contains("com.example.app.domain.order_line.model.OrderLine"));
    }

    #[test]
    fn id_type_follows_entity_id() {
        let spec = spec(
            "app: {}\nmodels:\n- name: Order\n  rest: true\n  id: {field: id, type: UUID}\n",
        );
        let options = CompileOptions::from_spec(&spec);
        let units = RestResourceCompiler::compile(&spec.entities[0], &options).unwrap();
        assert_eq!(units[0].model["idType"], "UUID");
        assert!(units[0].imports.contains("java.util.UUID"));
    }

    #[test]
    fn document_store_uses_mongo_repository() {
        let spec = spec("app: {}\ndatabase: mongodb\nmodels:\n- name: Order\n  rest: true\n");
        let options = CompileOptions::from_spec(&spec);
        let units = RestResourceCompiler::compile(&spec.entities[0], &options).unwrap();
        assert_eq!(units[0].model["baseInterface"], "MongoRepository");
        assert!(units[0]
            .imports
            .contains("org.springframework.data.mongodb.repository.MongoRepository"));
    }

    #[test]
    fn support_unit_is_shared() {
        let spec = spec("app: {}\n");
        let options = CompileOptions::from_spec(&spec);
        let unit = support_unit(&options);
        assert_eq!(unit.package, "com.example.app.util");
        assert_eq!(unit.class_name, "NotFoundException");
    }
}
