//! Enum compiler: one artifact per declared enum.
//!
//! Enums always land in the shared model package so that entities from any
//! domain package can reference them. The storage mode itself is carried in
//! [`crate::unit::CompileOptions::enums`] for the entity and DTO compilers.

use specforge_core::casing::to_upper_camel;
use specforge_core::spec::EnumSpec;

use crate::error::CodegenError;
use crate::unit::{template_candidates, CompileOptions, GenerationUnit};

pub struct EnumCompiler;

impl EnumCompiler {
    pub fn compile(decl: &EnumSpec, options: &CompileOptions) -> Result<GenerationUnit, CodegenError> {
        let mut unit = GenerationUnit::new(
            format!("{}.model", options.base_package),
            to_upper_camel(&decl.name),
            template_candidates(options.language, "enum"),
        );
        unit.set("constants", serde_json::json!(decl.constants));
        Ok(unit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use specforge_core::spec::parser::parse_spec;

    #[test]
    fn enum_unit_lands_in_model_package_with_ordered_constants() {
        let spec = parse_spec(
            "app: {}\nenums:\n- name: orderStatus\n  constants: [OPEN, SHIPPED, CANCELLED]\n",
        )
        .unwrap();
        let options = CompileOptions::from_spec(&spec);
        let unit = EnumCompiler::compile(&spec.enums[0], &options).unwrap();

        assert_eq!(unit.package, "com.example.app.model");
        assert_eq!(unit.class_name, "OrderStatus");
        assert_eq!(
            unit.model["constants"],
            serde_json::json!(["OPEN", "SHIPPED", "CANCELLED"])
        );
        assert!(unit.imports.is_empty());
    }
}
