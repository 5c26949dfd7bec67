//! Entity compiler: one [`GenerationUnit`] per declared entity.
//!
//! Builds the identifier block, one property block per non-relation field,
//! one property block per relation, and the table-level annotations. When
//! the datastore is a document store the relational annotation set is
//! swapped for the document mapping set.

use specforge_core::casing::{pluralize, to_lower_snake, to_upper_camel};
use specforge_core::spec::{
    Cardinality, Datastore, EntitySpec, EnumStorage, FieldSpec, IdStrategy, RelationSpec,
    TargetLanguage,
};

use crate::constraints::{build_constraint, inferred_length};
use crate::error::CodegenError;
use crate::packages::{package_for, ArtifactKind};
use crate::types::{leaf_token, resolve};
use crate::unit::{template_candidates, CompileOptions, GenerationUnit, PropertyModel};

pub struct EntityCompiler;

impl EntityCompiler {
    /// Compile one entity into its generation unit.
    pub fn compile(
        entity: &EntitySpec,
        options: &CompileOptions,
    ) -> Result<GenerationUnit, CodegenError> {
        let class_name = to_upper_camel(&entity.name);
        let package = package_for(
            &options.base_package,
            options.layout,
            ArtifactKind::Model,
            Some(&entity.name),
        );
        let mut unit = GenerationUnit::new(
            package,
            class_name,
            template_candidates(options.language, "entity"),
        );

        let table = table_name(entity, options);
        class_annotations(&mut unit, entity, &table, options);

        let mut properties = vec![id_property(&mut unit, entity, &table, options)];
        for field in &entity.fields {
            properties.push(field_property(&mut unit, field, options));
        }
        for relation in &entity.relations {
            properties.push(relation_property(&mut unit, relation, options)?);
        }
        if entity.soft_delete && !options.datastore.is_document() {
            properties.push(soft_delete_property(&mut unit, options));
        }
        if entity.auditing {
            properties.extend(auditing_properties(&mut unit, options));
        }

        unit.set_properties(&properties);
        unit.set("plain", serde_json::Value::Bool(plain_accessors(options)));
        Ok(unit)
    }
}

/// Whether the template should emit native getters/setters.
fn plain_accessors(options: &CompileOptions) -> bool {
    options.language == TargetLanguage::Java && !options.uses_lombok()
}

fn table_name(entity: &EntitySpec, options: &CompileOptions) -> String {
    match &entity.table {
        Some(table) => table.clone(),
        None => {
            let snake = to_lower_snake(&entity.name);
            if options.pluralize_tables {
                pluralize(&snake)
            } else {
                snake
            }
        }
    }
}

/// Class-literal syntax differs between the target languages.
fn class_literal(language: TargetLanguage, name: &str) -> String {
    match language {
        TargetLanguage::Java => format!("{name}.class"),
        TargetLanguage::Kotlin => format!("{name}::class"),
    }
}

// ---------------------------------------------------------------------------
// Class-level annotations
// ---------------------------------------------------------------------------

fn class_annotations(
    unit: &mut GenerationUnit,
    entity: &EntitySpec,
    table: &str,
    options: &CompileOptions,
) {
    let mut annotations = Vec::new();

    if options.datastore.is_document() {
        annotations.push(format!("@Document(collection = \"{table}\")"));
        unit.add_import("org.springframework.data.mongodb.core.mapping.Document");
    } else {
        annotations.push("@Entity".to_string());
        unit.add_import("jakarta.persistence.Entity");
        annotations.push(table_annotation(unit, entity, table));
        unit.add_import("jakarta.persistence.Table");

        if entity.immutable {
            annotations.push("@Immutable".to_string());
            unit.add_import("org.hibernate.annotations.Immutable");
        }
        if entity.soft_delete {
            annotations.push(format!(
                "@SQLDelete(sql = \"UPDATE {table} SET deleted = true WHERE id = ?\")"
            ));
            annotations.push("@SQLRestriction(\"deleted = false\")".to_string());
            unit.add_import("org.hibernate.annotations.SQLDelete");
            unit.add_import("org.hibernate.annotations.SQLRestriction");
        }
    }

    if entity.auditing {
        let listener = class_literal(options.language, "AuditingEntityListener");
        annotations.push(format!("@EntityListeners({listener})"));
        unit.add_import("jakarta.persistence.EntityListeners");
        unit.add_import("org.springframework.data.jpa.domain.support.AuditingEntityListener");
    }

    if options.uses_lombok() {
        annotations.push("@Getter".to_string());
        annotations.push("@Setter".to_string());
        unit.add_import("lombok.Getter");
        unit.add_import("lombok.Setter");
    }

    unit.set("classAnnotations", serde_json::json!(annotations));
}

fn table_annotation(unit: &mut GenerationUnit, entity: &EntitySpec, table: &str) -> String {
    let mut arguments = vec![format!("name = \"{table}\"")];
    if let Some(schema) = &entity.schema {
        arguments.push(format!("schema = \"{schema}\""));
    }
    if !entity.unique_groups.is_empty() {
        let constraints: Vec<String> = entity
            .unique_groups
            .iter()
            .map(|group| {
                let columns: Vec<String> = group
                    .iter()
                    .map(|field| format!("\"{}\"", to_lower_snake(field)))
                    .collect();
                format!(
                    "@UniqueConstraint(columnNames = {{{}}})",
                    columns.join(", ")
                )
            })
            .collect();
        arguments.push(format!("uniqueConstraints = {{{}}}", constraints.join(", ")));
        unit.add_import("jakarta.persistence.UniqueConstraint");
    }
    format!("@Table({})", arguments.join(", "))
}

// ---------------------------------------------------------------------------
// Identifier block
// ---------------------------------------------------------------------------

fn id_property(
    unit: &mut GenerationUnit,
    entity: &EntitySpec,
    table: &str,
    options: &CompileOptions,
) -> PropertyModel {
    let resolved = resolve(&entity.id.type_token, options.language);
    unit.add_imports(resolved.imports.clone());

    let mut annotations = Vec::new();

    if options.datastore.is_document() {
        annotations.push("@Id".to_string());
        unit.add_import("org.springframework.data.annotation.Id");
    } else {
        annotations.push("@Id".to_string());
        unit.add_import("jakarta.persistence.Id");

        match entity.id.strategy {
            IdStrategy::Identity => {
                annotations.push("@GeneratedValue(strategy = GenerationType.IDENTITY)".to_string());
            }
            IdStrategy::Sequence => {
                let sequence = format!("{table}_sequence");
                annotations.push(format!(
                    "@GeneratedValue(strategy = GenerationType.SEQUENCE, generator = \"{sequence}\")"
                ));
                annotations.push(format!(
                    "@SequenceGenerator(name = \"{sequence}\", sequenceName = \"{sequence}\", allocationSize = 1)"
                ));
                unit.add_import("jakarta.persistence.SequenceGenerator");
            }
            IdStrategy::Uuid => {
                annotations.push("@GeneratedValue(strategy = GenerationType.UUID)".to_string());
            }
            IdStrategy::Auto => {
                annotations.push("@GeneratedValue(strategy = GenerationType.AUTO)".to_string());
            }
            IdStrategy::None => {}
        }
        if entity.id.strategy != IdStrategy::None {
            unit.add_import("jakarta.persistence.GeneratedValue");
            unit.add_import("jakarta.persistence.GenerationType");
        }

        annotations.push("@Column(nullable = false, updatable = false)".to_string());
        unit.add_import("jakarta.persistence.Column");
    }

    PropertyModel {
        annotations,
        type_name: resolved.name,
        name: entity.id.field.clone(),
        initializer: None,
    }
}

// ---------------------------------------------------------------------------
// Field blocks
// ---------------------------------------------------------------------------

fn field_property(
    unit: &mut GenerationUnit,
    field: &FieldSpec,
    options: &CompileOptions,
) -> PropertyModel {
    let resolved = resolve(&field.type_token, options.language);
    unit.add_imports(resolved.imports.clone());

    let mut annotations = Vec::new();
    let mut not_null = false;

    for constraint in &field.constraints {
        match build_constraint(constraint) {
            Some(built) => {
                not_null |= constraint.kind == "NotNull";
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

    // Enum-typed fields get the storage annotation matching the declared
    // enum. Document stores persist the constant name natively.
    let leaf = leaf_token(&field.type_token);
    if let Some(storage) = options.enums.get(leaf) {
        if !options.datastore.is_document() {
            let mode = match storage {
                EnumStorage::Name => "STRING",
                EnumStorage::Ordinal => "ORDINAL",
            };
            annotations.push(format!("@Enumerated(EnumType.{mode})"));
            unit.add_import("jakarta.persistence.Enumerated");
            unit.add_import("jakarta.persistence.EnumType");
        }
        let enum_package = format!("{}.model", options.base_package);
        if unit.package != enum_package {
            unit.add_import(format!("{enum_package}.{leaf}"));
        }
    }

    if field.natural_id && !options.datastore.is_document() {
        annotations.push("@NaturalId".to_string());
        unit.add_import("org.hibernate.annotations.NaturalId");
    }

    if options.datastore.is_document() {
        if let Some(name) = &field.column.name {
            annotations.push(format!("@Field(\"{name}\")"));
            unit.add_import("org.springframework.data.mongodb.core.mapping.Field");
        }
        if field.column.unique {
            annotations.push("@Indexed(unique = true)".to_string());
            unit.add_import("org.springframework.data.mongodb.core.index.Indexed");
        }
    } else if let Some(column) = column_annotation(field, &resolved.name, not_null) {
        annotations.push(column);
        unit.add_import("jakarta.persistence.Column");
    }

    PropertyModel {
        annotations,
        type_name: resolved.name,
        name: field.name.clone(),
        initializer: None,
    }
}

/// Build the `@Column` annotation for a field, or `None` when every
/// property is at its default. Length falls back to a `Size`-style `max`
/// constraint for string columns without an explicit length.
fn column_annotation(field: &FieldSpec, type_name: &str, not_null: bool) -> Option<String> {
    let mut arguments = Vec::new();

    if let Some(name) = &field.column.name {
        arguments.push(format!("name = \"{name}\""));
    }
    if not_null || !field.column.nullable {
        arguments.push("nullable = false".to_string());
    }
    if field.column.unique {
        arguments.push("unique = true".to_string());
    }
    let length = field.column.length.or_else(|| {
        if type_name == "String" {
            inferred_length(&field.constraints)
        } else {
            None
        }
    });
    if let Some(length) = length {
        arguments.push(format!("length = {length}"));
    }
    if let Some(definition) = &field.column.definition {
        arguments.push(format!("columnDefinition = \"{definition}\""));
    }

    if arguments.is_empty() {
        None
    } else {
        Some(format!("@Column({})", arguments.join(", ")))
    }
}

// ---------------------------------------------------------------------------
// Relation blocks
// ---------------------------------------------------------------------------

fn relation_property(
    unit: &mut GenerationUnit,
    relation: &RelationSpec,
    options: &CompileOptions,
) -> Result<PropertyModel, CodegenError> {
    if relation.cardinality == Cardinality::OneToMany && relation.mapped_by.is_none() {
        return Err(CodegenError::Compile(format!(
            "1:N relation '{}' is missing the inverse-side field name",
            relation.name
        )));
    }

    let target = to_upper_camel(&relation.target);

    // Import the target class when it lives in another package (domain layout).
    let target_package = package_for(
        &options.base_package,
        options.layout,
        ArtifactKind::Model,
        Some(&relation.target),
    );
    if target_package != unit.package {
        unit.add_import(format!("{target_package}.{target}"));
    }

    if options.datastore.is_document() {
        return Ok(document_relation(unit, relation, &target, options));
    }

    let cascade = cascade_argument(unit, &relation.cascade);
    let mut annotations = Vec::new();
    let mut type_name = target.clone();
    let mut initializer = None;

    match relation.cardinality {
        Cardinality::ManyToOne => {
            annotations.push(join_annotation(unit, "@ManyToOne", &[
                "fetch = FetchType.LAZY".to_string(),
            ], &cascade));
            annotations.push(join_column(unit, relation));
        }
        Cardinality::OneToOne => match &relation.mapped_by {
            Some(inverse) => {
                annotations.push(join_annotation(unit, "@OneToOne", &[
                    format!("mappedBy = \"{inverse}\""),
                    "fetch = FetchType.LAZY".to_string(),
                ], &cascade));
            }
            None => {
                annotations.push(join_annotation(unit, "@OneToOne", &[
                    "fetch = FetchType.LAZY".to_string(),
                ], &cascade));
                annotations.push(join_column(unit, relation));
            }
        },
        Cardinality::OneToMany => {
            let mut arguments = vec![format!(
                "mappedBy = \"{}\"",
                relation.mapped_by.as_deref().unwrap_or_default()
            )];
            if relation.orphan_removal {
                arguments.push("orphanRemoval = true".to_string());
            }
            annotations.push(join_annotation(unit, "@OneToMany", &arguments, &cascade));
            (type_name, initializer) =
                collection_type(unit, relation, &target, options, &mut annotations);
        }
        Cardinality::ManyToMany => {
            match (&relation.mapped_by, &relation.join_table) {
                (Some(inverse), _) => {
                    annotations.push(join_annotation(
                        unit,
                        "@ManyToMany",
                        &[format!("mappedBy = \"{inverse}\"")],
                        &cascade,
                    ));
                }
                (None, Some(join)) => {
                    annotations.push(join_annotation(unit, "@ManyToMany", &[], &cascade));
                    annotations.push(format!(
                        "@JoinTable(name = \"{}\", joinColumns = @JoinColumn(name = \"{}\"), inverseJoinColumns = @JoinColumn(name = \"{}\"))",
                        join.name, join.join_column, join.inverse_join_column
                    ));
                    unit.add_import("jakarta.persistence.JoinTable");
                    unit.add_import("jakarta.persistence.JoinColumn");
                }
                (None, None) => {
                    return Err(CodegenError::Compile(format!(
                        "owning side of N:N relation '{}' is missing its join table",
                        relation.name
                    )));
                }
            }
            (type_name, initializer) =
                collection_type(unit, relation, &target, options, &mut annotations);
        }
    }

    Ok(PropertyModel {
        annotations,
        type_name,
        name: relation.name.clone(),
        initializer,
    })
}

/// Build a relation annotation with its optional cascade argument.
fn join_annotation(
    unit: &mut GenerationUnit,
    base: &str,
    arguments: &[String],
    cascade: &Option<String>,
) -> String {
    let name = &base[1..];
    unit.add_import(format!("jakarta.persistence.{name}"));
    if arguments.iter().any(|a| a.contains("FetchType")) {
        unit.add_import("jakarta.persistence.FetchType");
    }

    let mut all: Vec<String> = arguments.to_vec();
    if let Some(cascade) = cascade {
        all.push(cascade.clone());
    }

    if all.is_empty() {
        base.to_string()
    } else {
        format!("{base}({})", all.join(", "))
    }
}

fn join_column(unit: &mut GenerationUnit, relation: &RelationSpec) -> String {
    let column = relation
        .join_column
        .clone()
        .unwrap_or_else(|| format!("{}_id", to_lower_snake(&relation.name)));
    unit.add_import("jakarta.persistence.JoinColumn");
    format!("@JoinColumn(name = \"{column}\")")
}

fn cascade_argument(unit: &mut GenerationUnit, cascade: &[String]) -> Option<String> {
    if cascade.is_empty() {
        return None;
    }
    unit.add_import("jakarta.persistence.CascadeType");
    if cascade.iter().any(|c| c.eq_ignore_ascii_case("all")) {
        return Some("cascade = CascadeType.ALL".to_string());
    }
    let types: Vec<String> = cascade
        .iter()
        .map(|c| format!("CascadeType.{}", c.to_ascii_uppercase()))
        .collect();
    Some(format!("cascade = {{{}}}", types.join(", ")))
}

/// Collection declaration for the many-valued side: ordered relations get a
/// `List` with `@OrderBy`, the rest a `Set`.
fn collection_type(
    unit: &mut GenerationUnit,
    relation: &RelationSpec,
    target: &str,
    options: &CompileOptions,
    annotations: &mut Vec<String>,
) -> (String, Option<String>) {
    let ordered = relation.order_by.is_some();
    if let Some(order) = &relation.order_by {
        annotations.push(format!("@OrderBy(\"{order}\")"));
        unit.add_import("jakarta.persistence.OrderBy");
    }

    match options.language {
        TargetLanguage::Java => {
            if ordered {
                unit.add_import("java.util.ArrayList");
                unit.add_import("java.util.List");
                (format!("List<{target}>"), Some("new ArrayList<>()".to_string()))
            } else {
                unit.add_import("java.util.HashSet");
                unit.add_import("java.util.Set");
                (format!("Set<{target}>"), Some("new HashSet<>()".to_string()))
            }
        }
        TargetLanguage::Kotlin => {
            if ordered {
                (format!("MutableList<{target}>"), Some("mutableListOf()".to_string()))
            } else {
                (format!("MutableSet<{target}>"), Some("mutableSetOf()".to_string()))
            }
        }
    }
}

/// Document-store relation: reference instead of join.
fn document_relation(
    unit: &mut GenerationUnit,
    relation: &RelationSpec,
    target: &str,
    options: &CompileOptions,
) -> PropertyModel {
    unit.add_import("org.springframework.data.mongodb.core.mapping.DocumentReference");
    let mut annotations = vec!["@DocumentReference(lazy = true)".to_string()];

    let (type_name, initializer) = if relation.cardinality.is_collection() {
        collection_type(unit, relation, target, options, &mut annotations)
    } else {
        (target.to_string(), None)
    };

    PropertyModel {
        annotations,
        type_name,
        name: relation.name.clone(),
        initializer,
    }
}

// ---------------------------------------------------------------------------
// Structural option blocks
// ---------------------------------------------------------------------------

fn soft_delete_property(unit: &mut GenerationUnit, options: &CompileOptions) -> PropertyModel {
    unit.add_import("jakarta.persistence.Column");
    PropertyModel {
        annotations: vec!["@Column(nullable = false)".to_string()],
        type_name: "Boolean".to_string(),
        name: "deleted".to_string(),
        initializer: Some(match options.language {
            TargetLanguage::Java => "Boolean.FALSE".to_string(),
            TargetLanguage::Kotlin => "false".to_string(),
        }),
    }
}

fn auditing_properties(
    unit: &mut GenerationUnit,
    _options: &CompileOptions,
) -> Vec<PropertyModel> {
    unit.add_import("java.time.OffsetDateTime");
    unit.add_import("org.springframework.data.annotation.CreatedDate");
    unit.add_import("org.springframework.data.annotation.LastModifiedDate");

    vec![
        PropertyModel {
            annotations: vec![
                "@CreatedDate".to_string(),
                "@Column(nullable = false, updatable = false)".to_string(),
            ],
            type_name: "OffsetDateTime".to_string(),
            name: "dateCreated".to_string(),
            initializer: None,
        },
        PropertyModel {
            annotations: vec![
                "@LastModifiedDate".to_string(),
                "@Column(nullable = false)".to_string(),
            ],
            type_name: "OffsetDateTime".to_string(),
            name: "lastUpdated".to_string(),
            initializer: None,
        },
    ]
}

/// The shared sequence-listener artifact for document stores with numeric
/// surrogate ids. Generated once per run.
pub fn sequence_listener_unit(options: &CompileOptions) -> GenerationUnit {
    let package = format!("{}.config", options.base_package);
    let mut unit = GenerationUnit::new(
        package,
        "PrimarySequenceListener",
        template_candidates(options.language, "sequence_listener"),
    );
    unit.add_import("org.bson.Document");
    unit.add_import("org.springframework.beans.BeanWrapperImpl");
    unit.add_import("org.springframework.data.mongodb.core.FindAndModifyOptions");
    unit.add_import("org.springframework.data.mongodb.core.MongoOperations");
    unit.add_import("org.springframework.data.mongodb.core.mapping.event.AbstractMongoEventListener");
    unit.add_import("org.springframework.data.mongodb.core.mapping.event.BeforeConvertEvent");
    unit.add_import("org.springframework.data.mongodb.core.query.Criteria");
    unit.add_import("org.springframework.data.mongodb.core.query.Query");
    unit.add_import("org.springframework.data.mongodb.core.query.Update");
    unit.add_import("org.springframework.stereotype.Component");
    if options.language == TargetLanguage::Java {
        unit.add_import("org.springframework.beans.BeanWrapper");
    }
    unit
}

/// Whether any entity needs the sequence-listener artifact: document store
/// plus an integer/long surrogate id.
pub fn needs_sequence_listener(entities: &[EntitySpec], datastore: Datastore) -> bool {
    datastore.is_document()
        && entities
            .iter()
            .any(|e| matches!(e.id.type_token.as_str(), "Long" | "Integer" | "Int"))
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
        EntityCompiler::compile(&spec.entities[0], &options).unwrap()
    }

    fn annotations_of<'a>(unit: &'a GenerationUnit, name: &str) -> Vec<String> {
        let properties = unit.model["properties"].as_array().unwrap();
        let property = properties
            .iter()
            .find(|p| p["name"] == name)
            .unwrap_or_else(|| panic!("no property '{name}'"));
        property["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn identity_id_block() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               id:\n\
                 field: id\n\
                 type: Long\n\
                 generation: {strategy: IDENTITY}\n",
        );
        let annotations = annotations_of(&unit, "id");
        assert!(annotations.contains(&"@Id".to_string()));
        assert!(annotations
            .contains(&"@GeneratedValue(strategy = GenerationType.IDENTITY)".to_string()));
        assert!(unit.imports.contains("jakarta.persistence.GenerationType"));
    }

    #[test]
    fn sequence_id_names_a_per_entity_generator() {
        let unit = compile_first("app: {}\nmodels:\n- name: OrderLine\n");
        let annotations = annotations_of(&unit, "id").join(" ");
        assert!(annotations.contains("generator = \"order_line_sequence\""));
        assert!(annotations.contains("@SequenceGenerator(name = \"order_line_sequence\""));
    }

    #[test]
    fn length_inferred_from_size_constraint() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Customer\n\
               fields:\n\
               - name: email\n\
                 type: String\n\
                 constraints:\n\
                 - name: Size\n\
                   max: 180\n",
        );
        let annotations = annotations_of(&unit, "email");
        assert!(annotations.contains(&"@Size(max = 180)".to_string()));
        assert!(annotations.contains(&"@Column(length = 180)".to_string()));
    }

    #[test]
    fn explicit_column_length_wins_over_inference() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Customer\n\
               fields:\n\
               - name: email\n\
                 type: String\n\
                 column: {length: 64}\n\
                 constraints:\n\
                 - name: Size\n\
                   max: 180\n",
        );
        let annotations = annotations_of(&unit, "email");
        assert!(annotations.contains(&"@Column(length = 64)".to_string()));
    }

    #[test]
    fn not_null_constraint_forces_non_nullable_column() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               fields:\n\
               - name: total\n\
                 type: Decimal\n\
                 constraints:\n\
                 - name: NotNull\n",
        );
        let annotations = annotations_of(&unit, "total");
        assert!(annotations.contains(&"@NotNull".to_string()));
        assert!(annotations.contains(&"@Column(nullable = false)".to_string()));
        assert!(unit.imports.contains("java.math.BigDecimal"));
    }

    #[test]
    fn enum_typed_field_gets_storage_annotation() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               fields:\n\
               - name: status\n\
                 type: OrderStatus\n\
             enums:\n\
             - name: OrderStatus\n\
               constants: [OPEN, SHIPPED]\n\
               storage: ordinal\n",
        );
        let annotations = annotations_of(&unit, "status");
        assert!(annotations.contains(&"@Enumerated(EnumType.ORDINAL)".to_string()));
    }

    #[test]
    fn many_to_one_gets_join_column() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: OrderLine\n\
               relations:\n\
               - name: order\n\
                 cardinality: 'N:1'\n\
                 target: Order\n\
             - name: Order\n",
        );
        let annotations = annotations_of(&unit, "order");
        assert!(annotations.contains(&"@ManyToOne(fetch = FetchType.LAZY)".to_string()));
        assert!(annotations.contains(&"@JoinColumn(name = \"order_id\")".to_string()));
    }

    #[test]
    fn one_to_many_declares_a_collection() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               relations:\n\
               - name: lines\n\
                 cardinality: '1:N'\n\
                 target: OrderLine\n\
                 mappedBy: order\n\
                 orphanRemoval: true\n\
             - name: OrderLine\n",
        );
        let properties = unit.model["properties"].as_array().unwrap();
        let lines = properties.iter().find(|p| p["name"] == "lines").unwrap();
        assert_eq!(lines["type"], "Set<OrderLine>");
        assert_eq!(lines["initializer"], "new HashSet<>()");
        let annotations = annotations_of(&unit, "lines").join(" ");
        assert!(annotations.contains("mappedBy = \"order\""));
        assert!(annotations.contains("orphanRemoval = true"));
    }

    #[test]
    fn one_to_many_without_inverse_fails_deterministically() {
        let text = "app: {}\n\
             models:\n\
             - name: Order\n\
               relations:\n\
               - name: lines\n\
                 cardinality: '1:N'\n\
                 target: OrderLine\n\
             - name: OrderLine\n";
        let spec = spec(text);
        let options = CompileOptions::from_spec(&spec);
        for _ in 0..2 {
            let err = EntityCompiler::compile(&spec.entities[0], &options).unwrap_err();
            assert!(matches!(err, CodegenError::Compile(ref msg)
                if msg.contains("inverse-side")));
        }
    }

    #[test]
    fn ordered_relation_becomes_a_list() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               relations:\n\
               - name: lines\n\
                 cardinality: '1:N'\n\
                 target: OrderLine\n\
                 mappedBy: order\n\
                 orderBy: position ASC\n\
             - name: OrderLine\n",
        );
        let properties = unit.model["properties"].as_array().unwrap();
        let lines = properties.iter().find(|p| p["name"] == "lines").unwrap();
        assert_eq!(lines["type"], "List<OrderLine>");
        assert!(annotations_of(&unit, "lines")
            .contains(&"@OrderBy(\"position ASC\")".to_string()));
    }

    #[test]
    fn many_to_many_owning_side_renders_join_table() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               relations:\n\
               - name: tags\n\
                 cardinality: 'N:N'\n\
                 target: Tag\n\
                 joinTable:\n\
                   name: order_tags\n\
                   joinColumn: order_id\n\
                   inverseJoinColumn: tag_id\n\
             - name: Tag\n",
        );
        let annotations = annotations_of(&unit, "tags").join(" ");
        assert!(annotations.contains("@JoinTable(name = \"order_tags\""));
        assert!(annotations.contains("joinColumns = @JoinColumn(name = \"order_id\")"));
    }

    #[test]
    fn composite_unique_groups_render_table_constraints() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Seat\n\
               uniqueConstraints:\n\
               - [rowNumber, seatNumber]\n",
        );
        let class_annotations = unit.model["classAnnotations"].as_array().unwrap();
        let table = class_annotations[1].as_str().unwrap();
        assert!(table.contains(
            "uniqueConstraints = {@UniqueConstraint(columnNames = {\"row_number\", \"seat_number\"})}"
        ));
    }

    #[test]
    fn pluralize_option_affects_table_name() {
        let unit = compile_first(
            "app: {}\n\
             features: {pluralizeTableNames: true}\n\
             models:\n\
             - name: Category\n",
        );
        let class_annotations = unit.model["classAnnotations"].as_array().unwrap();
        assert_eq!(
            class_annotations[1].as_str().unwrap(),
            "@Table(name = \"categories\")"
        );
    }

    #[test]
    fn document_store_swaps_annotation_set() {
        let unit = compile_first(
            "app: {}\n\
             database: mongodb\n\
             models:\n\
             - name: Order\n\
               fields:\n\
               - name: total\n\
                 type: Decimal\n\
               relations:\n\
               - name: customer\n\
                 cardinality: 'N:1'\n\
                 target: Customer\n\
             - name: Customer\n",
        );
        let class_annotations = unit.model["classAnnotations"].as_array().unwrap();
        assert_eq!(
            class_annotations[0].as_str().unwrap(),
            "@Document(collection = \"order\")"
        );
        assert!(annotations_of(&unit, "customer")
            .contains(&"@DocumentReference(lazy = true)".to_string()));
        assert!(unit.imports.contains("org.springframework.data.annotation.Id"));
        assert!(!unit.imports.contains("jakarta.persistence.Entity"));
    }

    #[test]
    fn lombok_style_adds_class_annotations() {
        let unit = compile_first("app: {}\nmodels:\n- name: Order\n");
        let class_annotations = unit.model["classAnnotations"].as_array().unwrap();
        assert!(class_annotations.iter().any(|a| a == "@Getter"));
        assert_eq!(unit.model["plain"], false);
    }

    #[test]
    fn plain_style_enables_native_accessors() {
        let unit = compile_first("app: {}\nboilerplate: plain\nmodels:\n- name: Order\n");
        assert_eq!(unit.model["plain"], true);
    }

    #[test]
    fn soft_delete_and_auditing_blocks() {
        let unit = compile_first(
            "app: {}\n\
             models:\n\
             - name: Order\n\
               options: {auditing: true, softDelete: true}\n",
        );
        let class_annotations: Vec<String> = unit.model["classAnnotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap().to_string())
            .collect();
        assert!(class_annotations
            .iter()
            .any(|a| a.starts_with("@SQLDelete")));
        assert!(class_annotations
            .contains(&"@EntityListeners(AuditingEntityListener.class)".to_string()));
        assert!(annotations_of(&unit, "dateCreated").contains(&"@CreatedDate".to_string()));
        assert!(annotations_of(&unit, "deleted").len() == 1);
    }

    #[test]
    fn kotlin_uses_class_literal_syntax_and_mutable_collections() {
        let unit = compile_first(
            "app: {}\n\
             language: kotlin\n\
             models:\n\
             - name: Order\n\
               options: {auditing: true}\n\
               relations:\n\
               - name: lines\n\
                 cardinality: '1:N'\n\
                 target: OrderLine\n\
                 mappedBy: order\n\
             - name: OrderLine\n",
        );
        let class_annotations: Vec<String> = unit.model["classAnnotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap().to_string())
            .collect();
        assert!(class_annotations
            .contains(&"@EntityListeners(AuditingEntityListener::class)".to_string()));
        let properties = unit.model["properties"].as_array().unwrap();
        let lines = properties.iter().find(|p| p["name"] == "lines").unwrap();
        assert_eq!(lines["type"], "MutableSet<OrderLine>");
        assert_eq!(lines["initializer"], "mutableSetOf()");
    }

    #[test]
    fn sequence_listener_needed_only_for_numeric_document_ids() {
        let mongo = spec("app: {}\ndatabase: mongodb\nmodels:\n- name: Order\n");
        assert!(needs_sequence_listener(&mongo.entities, mongo.datastore));

        let uuid = spec(
            "app: {}\ndatabase: mongodb\nmodels:\n- name: Order\n  id: {field: id, type: UUID}\n",
        );
        assert!(!needs_sequence_listener(&uuid.entities, uuid.datastore));

        let relational = spec("app: {}\nmodels:\n- name: Order\n");
        assert!(!needs_sequence_listener(&relational.entities, relational.datastore));
    }
}
