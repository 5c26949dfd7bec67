//! Structural invariants of a parsed [`ApplicationSpec`].
//!
//! These checks run synchronously at submission time; a spec that fails
//! here never enters the pipeline.

use std::collections::HashSet;

use super::{ApplicationSpec, Cardinality, EntitySpec};
use crate::error::CoreError;

/// Validate all spec invariants. Returns the first violation found.
///
/// - `basePackage` is a non-empty dotted identifier.
/// - Entity names are unique case-insensitively.
/// - Every relation target resolves to a declared entity.
/// - 1:N relations carry an inverse-side field name.
/// - N:N relations carry a join-table descriptor on the owning side.
/// - Enum constants are valid identifiers.
/// - Mapper endpoints resolve to a declared entity or DTO.
pub fn validate_spec(spec: &ApplicationSpec) -> Result<(), CoreError> {
    validate_base_package(&spec.base_package)?;

    let mut seen = HashSet::new();
    for entity in &spec.entities {
        if !seen.insert(entity.name.to_ascii_lowercase()) {
            return Err(CoreError::Spec(format!(
                "duplicate model name '{}' (names are unique case-insensitively)",
                entity.name
            )));
        }
        validate_entity(spec, entity)?;
    }

    for decl in &spec.enums {
        if decl.constants.is_empty() {
            return Err(CoreError::Spec(format!(
                "enum '{}' declares no constants",
                decl.name
            )));
        }
        for constant in &decl.constants {
            if !is_identifier(constant) {
                return Err(CoreError::Spec(format!(
                    "enum '{}': constant '{constant}' is not a valid identifier",
                    decl.name
                )));
            }
        }
    }

    for mapper in &spec.mappers {
        for side in [&mapper.source, &mapper.target] {
            if spec.find_entity(side).is_none() && spec.find_dto(side).is_none() {
                return Err(CoreError::Spec(format!(
                    "mapper {} -> {}: '{side}' is not a declared model or DTO",
                    mapper.source, mapper.target
                )));
            }
        }
    }

    Ok(())
}

fn validate_entity(spec: &ApplicationSpec, entity: &EntitySpec) -> Result<(), CoreError> {
    if !is_identifier(&entity.name) {
        return Err(CoreError::Spec(format!(
            "model name '{}' is not a valid identifier",
            entity.name
        )));
    }

    for field in &entity.fields {
        if !is_identifier(&field.name) {
            return Err(CoreError::Spec(format!(
                "model '{}': field name '{}' is not a valid identifier",
                entity.name, field.name
            )));
        }
    }

    for relation in &entity.relations {
        if spec.find_entity(&relation.target).is_none() {
            return Err(CoreError::Spec(format!(
                "model '{}': relation '{}' targets undeclared model '{}'",
                entity.name, relation.name, relation.target
            )));
        }
        match relation.cardinality {
            Cardinality::OneToMany if relation.mapped_by.is_none() => {
                return Err(CoreError::Spec(format!(
                    "model '{}': 1:N relation '{}' requires an inverse-side field (mappedBy)",
                    entity.name, relation.name
                )));
            }
            Cardinality::ManyToMany
                if relation.mapped_by.is_none() && relation.join_table.is_none() =>
            {
                return Err(CoreError::Spec(format!(
                    "model '{}': owning side of N:N relation '{}' requires a joinTable",
                    entity.name, relation.name
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate_base_package(base: &str) -> Result<(), CoreError> {
    if base.is_empty() {
        return Err(CoreError::Spec("basePackage must not be empty".to_string()));
    }
    for segment in base.split('.') {
        if !is_identifier(segment) {
            return Err(CoreError::Spec(format!(
                "basePackage segment '{segment}' is not a valid identifier"
            )));
        }
    }
    Ok(())
}

/// ASCII identifier: starts with a letter or underscore, continues with
/// letters, digits or underscores.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
