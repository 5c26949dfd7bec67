//! DTO compiler: one class per declared DTO under the `dto.request` /
//! `dto.response` sub-namespaces, plus the shared validator helper
//! artifacts for class-level cross-field constraints.

use specforge_core::casing::to_upper_camel;
use specforge_core::spec::{ClassConstraintSpec, DtoSpec, FieldSpec, TargetLanguage};

use crate::constraints::build_constraint;
use crate::error::CodegenError;
use crate::packages::dto_package;
use crate::types::{leaf_token, resolve};
use crate::unit::{template_candidates, CompileOptions, GenerationUnit, PropertyModel};

pub struct DtoCompiler;

impl DtoCompiler {
    /// Compile one DTO into its generation unit.
    pub fn compile(dto: &DtoSpec, options: &CompileOptions) -> Result<GenerationUnit, CodegenError> {
        let class_name = to_upper_camel(&dto.name);
        let package = dto_package(&options.base_package, dto.kind.sub_package());
        let mut unit = GenerationUnit::new(
            package,
            class_name,
            template_candidates(options.language, "dto"),
        );

        let mut class_annotations = Vec::new();
        for constraint in &dto.class_constraints {
            class_annotations.push(class_constraint_annotation(&mut unit, constraint, options));
        }
        if options.uses_lombok() {
            class_annotations.push("@Getter".to_string());
            class_annotations.push("@Setter".to_string());
            unit.add_import("lombok.Getter");
            unit.add_import("lombok.Setter");
        }
        unit.set("classAnnotations", serde_json::json!(class_annotations));

        let properties: Vec<PropertyModel> = dto
            .fields
            .iter()
            .map(|field| field_property(&mut unit, field, options))
            .collect();
        unit.set_properties(&properties);
        unit.set(
            "plain",
            serde_json::Value::Bool(
                options.language == TargetLanguage::Java && !options.uses_lombok(),
            ),
        );
        Ok(unit)
    }
}

fn field_property(
    unit: &mut GenerationUnit,
    field: &FieldSpec,
    options: &CompileOptions,
) -> PropertyModel {
    let resolved = resolve(&field.type_token, options.language);
    unit.add_imports(resolved.imports.clone());

    let mut annotations = Vec::new();
    for constraint in &field.constraints {
        match build_constraint(constraint) {
            Some(built) => {
                annotations.push(built.annotation);
                unit.add_imports(built.imports);
                if let Some(message) = built.message {
                    unit.messages.push(message);
                }
            }
            None => {
                tracing::warn!(
                    field = %field.name,
                    kind = %constraint.kind,
                    "Skipping unknown constraint kind",
                );
            }
        }
    }

    // Nested object-typed and list-of-object fields cascade validation.
    let leaf = leaf_token(&field.type_token);
    let leaf_resolved = resolve(leaf, options.language);
    if !leaf_resolved.known && !options.enums.contains_key(leaf) {
        annotations.push("@Valid".to_string());
        unit.add_import("jakarta.validation.Valid");
    }

    PropertyModel {
        annotations,
        type_name: resolved.name,
        name: field.name.clone(),
        initializer: None,
    }
}

fn class_constraint_annotation(
    unit: &mut GenerationUnit,
    constraint: &ClassConstraintSpec,
    options: &CompileOptions,
) -> String {
    let util = format!("{}.util", options.base_package);
    match constraint {
        ClassConstraintSpec::FieldMatch { field, other } => {
            unit.add_import(format!("{util}.FieldMatch"));
            format!("@FieldMatch(field = \"{field}\", other = \"{other}\")")
        }
        ClassConstraintSpec::ConditionalRequired {
            field,
            when_field,
            when_value,
        } => {
            unit.add_import(format!("{util}.ConditionalRequired"));
            match when_value {
                Some(value) => format!(
                    "@ConditionalRequired(field = \"{field}\", whenField = \"{when_field}\", whenValue = \"{value}\")"
                ),
                None => format!(
                    "@ConditionalRequired(field = \"{field}\", whenField = \"{when_field}\")"
                ),
            }
        }
        ClassConstraintSpec::ScriptAssert { script } => {
            unit.add_import(format!("{util}.ScriptAssert"));
            format!("@ScriptAssert(script = \"{}\")", script.replace('"', "\\\""))
        }
    }
}

/// Validator helper artifacts for every cross-field constraint kind used by
/// the declared DTOs. Each helper is written once per base package; the
/// stage skips units whose file already exists.
pub fn validator_units(dtos: &[DtoSpec], options: &CompileOptions) -> Vec<GenerationUnit> {
    let mut kinds = Vec::new();
    for dto in dtos {
        for constraint in &dto.class_constraints {
            let kind = match constraint {
                ClassConstraintSpec::FieldMatch { .. } => "field_match",
                ClassConstraintSpec::ConditionalRequired { .. } => "conditional_required",
                ClassConstraintSpec::ScriptAssert { .. } => "script_assert",
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }

    let package = format!("{}.util", options.base_package);
    kinds
        .into_iter()
        .map(|kind| {
            let class_name = to_upper_camel(kind);
            let mut unit = GenerationUnit::new(
                package.clone(),
                class_name,
                template_candidates(options.language, kind),
            );
            validator_imports(&mut unit, kind, options.language);
            unit
        })
        .collect()
}

fn validator_imports(unit: &mut GenerationUnit, kind: &str, language: TargetLanguage) {
    unit.add_import("jakarta.validation.Constraint");
    unit.add_import("jakarta.validation.ConstraintValidator");
    unit.add_import("jakarta.validation.ConstraintValidatorContext");
    unit.add_import("jakarta.validation.Payload");

    match language {
        TargetLanguage::Java => {
            unit.add_import("java.lang.annotation.ElementType");
            unit.add_import("java.lang.annotation.Retention");
            unit.add_import("java.lang.annotation.RetentionPolicy");
            unit.add_import("java.lang.annotation.Target");
        }
        TargetLanguage::Kotlin => {
            unit.add_import("kotlin.reflect.KClass");
        }
    }

    match kind {
        "field_match" | "conditional_required" => {
            unit.add_import("org.springframework.beans.BeanWrapperImpl");
            if language == TargetLanguage::Java {
                unit.add_import("org.springframework.beans.BeanWrapper");
            }
        }
        "script_assert" => {
            unit.add_import("org.springframework.expression.Expression");
            unit.add_import("org.springframework.expression.spel.standard.SpelExpressionParser");
        }
        _ => {}
    }
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

    fn compile_first(text: &str) -> GenerationUnit {
        let spec = spec(text);
        let options = CompileOptions::from_spec(&spec);
        DtoCompiler::compile(&spec.dtos[0], &options).unwrap()
    }

    #[test]
    fn request_dto_lands_in_request_package() {
        let unit = compile_first("app: {}\ndtos:\n- name: OrderRequest\n  kind: request\n");
        assert_eq!(unit.package, "com.example.app.dto.request");
    }

    #[test]
    fn response_dto_lands_in_response_package() {
        let unit = compile_first("app: {}\ndtos:\n- name: OrderResponse\n  kind: response\n");
        assert_eq!(unit.package, "com.example.app.dto.response");
    }

    #[test]
    fn object_typed_field_gets_valid_marker() {
        let unit = compile_first(
            "app: {}\n\
             dtos:\n\
             - name: OrderRequest\n\
               fields:\n\
               - name: shipping\n\
                 type: AddressRequest\n\
               - name: total\n\
                 type: Decimal\n",
        );
        let properties = unit.model["properties"].as_array().unwrap();
        let shipping = &properties[0];
        assert!(shipping["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "@Valid"));
        let total = &properties[1];
        assert!(total["annotations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn list_of_object_field_gets_valid_marker() {
        let unit = compile_first(
            "app: {}\n\
             dtos:\n\
             - name: OrderRequest\n\
               fields:\n\
               - name: lines\n\
                 type: List<OrderLineRequest>\n",
        );
        let properties = unit.model["properties"].as_array().unwrap();
        assert!(properties[0]["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "@Valid"));
    }

    #[test]
    fn enum_typed_field_does_not_cascade() {
        let unit = compile_first(
            "app: {}\n\
             dtos:\n\
             - name: OrderRequest\n\
               fields:\n\
               - name: status\n\
                 type: OrderStatus\n\
             enums:\n\
             - name: OrderStatus\n\
               constants: [OPEN]\n",
        );
        let properties = unit.model["properties"].as_array().unwrap();
        assert!(properties[0]["annotations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn field_match_constraint_renders_annotation_and_import() {
        let unit = compile_first(
            "app: {}\n\
             dtos:\n\
             - name: RegistrationRequest\n\
               fields:\n\
               - name: password\n\
               - name: passwordConfirm\n\
               constraints:\n\
               - type: fieldMatch\n\
                 field: password\n\
                 other: passwordConfirm\n",
        );
        let class_annotations = unit.model["classAnnotations"].as_array().unwrap();
        assert_eq!(
            class_annotations[0].as_str().unwrap(),
            "@FieldMatch(field = \"password\", other = \"passwordConfirm\")"
        );
        assert!(unit.imports.contains("com.example.app.util.FieldMatch"));
    }

    #[test]
    fn validator_units_are_deduplicated_by_kind() {
        let spec = spec(
            "app: {}\n\
             dtos:\n\
             - name: A\n\
               constraints:\n\
               - {type: fieldMatch, field: x, other: y}\n\
             - name: B\n\
               constraints:\n\
               - {type: fieldMatch, field: p, other: q}\n\
               - {type: scriptAssert, script: 'total > 0'}\n",
        );
        let options = CompileOptions::from_spec(&spec);
        let units = validator_units(&spec.dtos, &options);
        let names: Vec<&str> = units.iter().map(|u| u.class_name.as_str()).collect();
        assert_eq!(names, vec!["FieldMatch", "ScriptAssert"]);
        assert!(units.iter().all(|u| u.package == "com.example.app.util"));
    }

    #[test]
    fn no_class_constraints_means_no_validator_units() {
        let spec = spec("app: {}\ndtos:\n- name: OrderRequest\n");
        let options = CompileOptions::from_spec(&spec);
        assert!(validator_units(&spec.dtos, &options).is_empty());
    }
}
