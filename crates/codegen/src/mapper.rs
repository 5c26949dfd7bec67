//! Mapper compiler.
//!
//! For each declared source/target pair this resolves both sides' simple
//! and qualified names plus field lists, builds forward and reverse
//! assignment lines for the fields present on both sides, and
//! de-duplicates generated class names across the run.

use std::collections::HashSet;

use specforge_core::casing::{to_lower_camel, to_upper_camel};
use specforge_core::spec::{ApplicationSpec, MapperSpec, TargetLanguage};

use crate::error::CodegenError;
use crate::packages::{dto_package, package_for, ArtifactKind};
use crate::unit::{template_candidates, CompileOptions, GenerationUnit};

pub struct MapperCompiler;

impl MapperCompiler {
    /// Compile every declared mapper. Class names are de-duplicated with a
    /// numeric suffix when two pairs would collide.
    pub fn compile_all(
        spec: &ApplicationSpec,
        options: &CompileOptions,
    ) -> Result<Vec<GenerationUnit>, CodegenError> {
        let mut used_names = HashSet::new();
        spec.mappers
            .iter()
            .map(|mapper| compile_one(spec, mapper, options, &mut used_names))
            .collect()
    }
}

/// Simple name, qualified name and field list of one mapping side.
struct Side {
    simple: String,
    qualified: String,
    fields: Vec<String>,
}

fn resolve_side(spec: &ApplicationSpec, name: &str, options: &CompileOptions) -> Result<Side, CodegenError> {
    if let Some(entity) = spec.find_entity(name) {
        let simple = to_upper_camel(&entity.name);
        let package = package_for(
            &options.base_package,
            options.layout,
            ArtifactKind::Model,
            Some(&entity.name),
        );
        let mut fields = vec![entity.id.field.clone()];
        fields.extend(entity.fields.iter().map(|f| f.name.clone()));
        return Ok(Side {
            qualified: format!("{package}.{simple}"),
            simple,
            fields,
        });
    }

    if let Some(dto) = spec.find_dto(name) {
        let simple = to_upper_camel(&dto.name);
        let package = dto_package(&options.base_package, dto.kind.sub_package());
        return Ok(Side {
            qualified: format!("{package}.{simple}"),
            simple,
            fields: dto.fields.iter().map(|f| f.name.clone()).collect(),
        });
    }

    Err(CodegenError::Compile(format!(
        "mapper side '{name}' is not a declared model or DTO"
    )))
}

fn compile_one(
    spec: &ApplicationSpec,
    mapper: &MapperSpec,
    options: &CompileOptions,
    used_names: &mut HashSet<String>,
) -> Result<GenerationUnit, CodegenError> {
    let source = resolve_side(spec, &mapper.source, options)?;
    let target = resolve_side(spec, &mapper.target, options)?;

    let base_name = mapper
        .name
        .clone()
        .map(|n| to_upper_camel(&n))
        .unwrap_or_else(|| format!("{}{}Mapper", source.simple, target.simple));
    let class_name = dedupe_name(base_name, used_names);

    let package = format!("{}.mapper", options.base_package);
    let mut unit = GenerationUnit::new(
        package,
        class_name,
        template_candidates(options.language, "mapper"),
    );

    // Assignment lines exist only for fields present on both sides, in
    // source declaration order.
    let common: Vec<&String> = source
        .fields
        .iter()
        .filter(|field| target.fields.contains(field))
        .collect();

    let assignment = |field: &str| match options.language {
        TargetLanguage::Java => {
            let pascal = to_upper_camel(field);
            format!("target.set{pascal}(source.get{pascal}());")
        }
        TargetLanguage::Kotlin => {
            let camel = to_lower_camel(field);
            format!("target.{camel} = source.{camel}")
        }
    };
    let lines: Vec<String> = common.iter().map(|field| assignment(field)).collect();

    unit.set("sourceType", source.simple.clone().into());
    unit.set("targetType", target.simple.clone().into());
    unit.set("forward", serde_json::json!(lines));
    unit.set("reverse", serde_json::json!(lines));

    unit.add_import("org.springframework.stereotype.Component");
    unit.add_import(source.qualified);
    unit.add_import(target.qualified);
    Ok(unit)
}

fn dedupe_name(base: String, used_names: &mut HashSet<String>) -> String {
    if used_names.insert(base.clone()) {
        return base;
    }
    let mut index = 2;
    loop {
        let candidate = format!("{base}{index}");
        if used_names.insert(candidate.clone()) {
            return candidate;
        }
        index += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use specforge_core::spec::parser::parse_spec;

    fn compile(text: &str) -> Vec<GenerationUnit> {
        let spec = parse_spec(text).unwrap();
        let options = CompileOptions::from_spec(&spec);
        MapperCompiler::compile_all(&spec, &options).unwrap()
    }

    #[test]
    fn assignments_cover_only_shared_fields() {
        let units = compile(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               fields:\n\
               - name: total\n\
                 type: Decimal\n\
               - name: internalNote\n\
             dtos:\n\
             - name: OrderResponse\n\
               kind: response\n\
               fields:\n\
               - name: id\n\
                 type: Long\n\
               - name: total\n\
                 type: Decimal\n\
             mappers:\n\
             - source: Order\n\
               target: OrderResponse\n",
        );
        let forward = units[0].model["forward"].as_array().unwrap();
        let lines: Vec<&str> = forward.iter().map(|l| l.as_str().unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                "target.setId(source.getId());",
                "target.setTotal(source.getTotal());"
            ]
        );
    }

    #[test]
    fn both_sides_are_imported() {
        let units = compile(
            "app: {}\n\
             models:\n- name: Order\n\
             dtos:\n- name: OrderResponse\n  kind: response\n\
             mappers:\n- source: Order\n  target: OrderResponse\n",
        );
        assert_eq!(units[0].class_name, "OrderOrderResponseMapper");
        assert!(units[0].imports.contains("com.example.app.model.Order"));
        assert!(units[0]
            .imports
            .contains("com.example.app.dto.response.OrderResponse"));
    }

    #[test]
    fn duplicate_class_names_get_suffixes() {
        let units = compile(
            "app: {}\n\
             models:\n- name: Order\n\
             dtos:\n- name: OrderResponse\n  kind: response\n\
             mappers:\n\
             - source: Order\n  target: OrderResponse\n\
             - source: Order\n  target: OrderResponse\n",
        );
        assert_eq!(units[0].class_name, "OrderOrderResponseMapper");
        assert_eq!(units[1].class_name, "OrderOrderResponseMapper2");
    }

    #[test]
    fn explicit_name_is_honored() {
        let units = compile(
            "app: {}\n\
             models:\n- name: Order\n\
             dtos:\n- name: OrderResponse\n  kind: response\n\
             mappers:\n- source: Order\n  target: OrderResponse\n  name: orderMapper\n",
        );
        assert_eq!(units[0].class_name, "OrderMapper");
    }

    #[test]
    fn kotlin_assignments_use_property_access() {
        let spec = parse_spec(
            "app: {}\n\
             language: kotlin\n\
             models:\n- name: Order\n\
             dtos:\n\
             - name: OrderResponse\n\
               kind: response\n\
               fields:\n\
               - name: id\n\
                 type: Long\n\
             mappers:\n- source: Order\n  target: OrderResponse\n",
        )
        .unwrap();
        let options = CompileOptions::from_spec(&spec);
        let units = MapperCompiler::compile_all(&spec, &options).unwrap();
        let forward = units[0].model["forward"].as_array().unwrap();
        assert_eq!(forward[0], "target.id = source.id");
    }
}
