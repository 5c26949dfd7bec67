//! Spec text parsing: YAML/JSON → generic tree → [`ApplicationSpec`].
//!
//! YAML is a superset of JSON, so a single `serde_yaml` pass covers both
//! input formats. Extraction is done field-by-field over the generic tree so
//! that every missing scalar falls back to its documented default and every
//! malformed section produces a targeted error instead of a serde trace.
//!
//! Defaults:
//!
//! | Key                  | Default                         |
//! |----------------------|---------------------------------|
//! | `app.group`          | `com.example`                   |
//! | `app.artifact`       | `app`                           |
//! | `app.version`        | `0.0.1-SNAPSHOT`                |
//! | `app.name`           | the artifact id                 |
//! | `app.description`    | empty                           |
//! | `app.buildTool`      | `maven`                         |
//! | `app.packaging`      | `jar`                           |
//! | `app.runtimeVersion` | `17`                            |
//! | `basePackage`        | `<group>.<sanitized artifact>`  |
//! | `layout`             | `technical`                     |
//! | `language`           | `java`                          |
//! | `boilerplate`        | `generated-accessors`           |
//! | `database`           | `none`                          |
//! | feature flags        | all off                         |

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use super::{
    AppMeta, ApplicationSpec, BoilerplateStyle, BuildTool, Cardinality, ClassConstraintSpec,
    ColumnSpec, ConstraintSpec, Datastore, DtoKind, DtoSpec, EntitySpec, EnumSpec, EnumStorage,
    FieldSpec, IdSpec, IdStrategy, JoinTableSpec, MapperSpec, PackageLayout, Packaging,
    RelationSpec, TargetLanguage,
};
use crate::error::CoreError;

/// Parse spec text into a typed [`ApplicationSpec`].
///
/// Fails with [`CoreError::Spec`] when the root is not a mapping, the
/// required `app` section is absent, or any token has an unknown value.
/// Invariant checks live in [`super::validate::validate_spec`].
pub fn parse_spec(text: &str) -> Result<ApplicationSpec, CoreError> {
    let root: Value = serde_yaml::from_str(text)
        .map_err(|e| CoreError::Spec(format!("spec is not valid YAML/JSON: {e}")))?;

    let root = root
        .as_mapping()
        .ok_or_else(|| CoreError::Spec("spec root must be a mapping".to_string()))?;

    let app = parse_app(root)?;

    let base_package = match opt_str(root, "basePackage") {
        Some(p) => p,
        None => default_base_package(&app.group, &app.artifact),
    };

    let layout = parse_token(root, "layout", "technical", PackageLayout::from_token)?;
    let language = parse_token(root, "language", "java", TargetLanguage::from_token)?;
    let boilerplate = parse_token(
        root,
        "boilerplate",
        "generated-accessors",
        BoilerplateStyle::from_token,
    )?;
    let datastore = parse_token(root, "database", "none", Datastore::from_token)?;

    let features = get(root, "features").and_then(Value::as_mapping);
    let feature_flag = |key: &str| {
        features
            .and_then(|f| get(f, key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    Ok(ApplicationSpec {
        app,
        base_package,
        layout,
        language,
        boilerplate,
        datastore,
        openapi: feature_flag("openapi"),
        container_compose: feature_flag("compose"),
        pluralize_tables: feature_flag("pluralizeTableNames"),
        entities: parse_list(root, "models", parse_entity)?,
        enums: parse_list(root, "enums", parse_enum)?,
        dtos: parse_list(root, "dtos", parse_dto)?,
        mappers: parse_list(root, "mappers", parse_mapper)?,
        dependencies: string_list(root, "dependencies"),
    })
}

// ---------------------------------------------------------------------------
// Section parsers
// ---------------------------------------------------------------------------

fn parse_app(root: &Mapping) -> Result<AppMeta, CoreError> {
    let app = get(root, "app")
        .ok_or_else(|| CoreError::Spec("missing required 'app' section".to_string()))?
        .as_mapping()
        .ok_or_else(|| CoreError::Spec("'app' section must be a mapping".to_string()))?;

    let group = str_or(app, &["groupId", "group"], "com.example");
    let artifact = str_or(app, &["artifactId", "artifact"], "app");
    let name = opt_str_any(app, &["name"]).unwrap_or_else(|| artifact.clone());

    Ok(AppMeta {
        version: str_or(app, &["version"], "0.0.1-SNAPSHOT"),
        description: str_or(app, &["description"], ""),
        build_tool: parse_token(app, "buildTool", "maven", BuildTool::from_token)?,
        packaging: parse_token(app, "packaging", "jar", Packaging::from_token)?,
        runtime_version: normalize_runtime(&str_or(app, &["runtimeVersion"], "17")),
        group,
        artifact,
        name,
    })
}

fn parse_entity(item: &Mapping) -> Result<EntitySpec, CoreError> {
    let name = require_str(item, "name", "model")?;
    let options = get(item, "options").and_then(Value::as_mapping);
    let option_flag = |key: &str| {
        options
            .and_then(|o| get(o, key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    Ok(EntitySpec {
        table: opt_str(item, "table"),
        schema: opt_str(item, "schema"),
        id: parse_id(item, &name)?,
        fields: parse_list(item, "fields", parse_field)?,
        relations: parse_list(item, "relations", parse_relation)?,
        unique_groups: parse_unique_groups(item),
        auditing: option_flag("auditing"),
        soft_delete: option_flag("softDelete"),
        immutable: option_flag("immutable"),
        rest: get(item, "rest").and_then(Value::as_bool).unwrap_or(false),
        name,
    })
}

fn parse_id(entity: &Mapping, entity_name: &str) -> Result<IdSpec, CoreError> {
    let Some(id) = get(entity, "id").and_then(Value::as_mapping) else {
        // Entities without an explicit id block get the default surrogate id.
        return Ok(IdSpec {
            field: "id".to_string(),
            type_token: "Long".to_string(),
            strategy: IdStrategy::Sequence,
        });
    };

    let strategy = match get(id, "generation").and_then(Value::as_mapping) {
        Some(generation) => {
            let token = str_or(generation, &["strategy"], "sequence");
            IdStrategy::from_token(&token).ok_or_else(|| {
                CoreError::Spec(format!(
                    "model '{entity_name}': unknown id generation strategy '{token}'"
                ))
            })?
        }
        None => IdStrategy::Sequence,
    };

    Ok(IdSpec {
        field: str_or(id, &["field"], "id"),
        type_token: str_or(id, &["type"], "Long"),
        strategy,
    })
}

fn parse_field(item: &Mapping) -> Result<FieldSpec, CoreError> {
    let name = require_str(item, "name", "field")?;
    let type_token = str_or(item, &["type"], "String");

    let mut constraints = Vec::new();
    if let Some(list) = get(item, "constraints").and_then(Value::as_sequence) {
        for entry in list {
            let mapping = entry.as_mapping().ok_or_else(|| {
                CoreError::Spec(format!("field '{name}': constraint must be a mapping"))
            })?;
            constraints.push(parse_constraint(mapping, &name)?);
        }
    }

    Ok(FieldSpec {
        constraints,
        column: parse_column(item),
        natural_id: get(item, "naturalId")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        type_token,
        name,
    })
}

fn parse_constraint(item: &Mapping, field: &str) -> Result<ConstraintSpec, CoreError> {
    let kind = require_str(item, "name", "constraint")
        .map_err(|_| CoreError::Spec(format!("field '{field}': constraint is missing 'name'")))?;

    // Every scalar entry other than the name and message key is a parameter.
    let mut params = BTreeMap::new();
    for (key, value) in item {
        let Some(key) = key.as_str() else { continue };
        if key == "name" || key == "message" {
            continue;
        }
        if let Some(scalar) = scalar_to_string(value) {
            params.insert(key.to_string(), scalar);
        }
    }

    Ok(ConstraintSpec {
        kind,
        params,
        message: opt_str(item, "message"),
    })
}

fn parse_column(field: &Mapping) -> ColumnSpec {
    let Some(column) = get(field, "column").and_then(Value::as_mapping) else {
        return ColumnSpec::default();
    };

    ColumnSpec {
        name: opt_str(column, "name"),
        length: get(column, "length")
            .and_then(Value::as_u64)
            .map(|v| v as u32),
        nullable: get(column, "nullable")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        unique: get(column, "unique")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        definition: opt_str(column, "definition"),
    }
}

fn parse_relation(item: &Mapping) -> Result<RelationSpec, CoreError> {
    let name = require_str(item, "name", "relation")?;
    let token = require_str(item, "cardinality", "relation")
        .map_err(|_| CoreError::Spec(format!("relation '{name}': missing 'cardinality'")))?;
    let cardinality = Cardinality::from_token(&token)
        .ok_or_else(|| CoreError::Spec(format!("relation '{name}': unknown cardinality '{token}'")))?;

    let join_table = match get(item, "joinTable").and_then(Value::as_mapping) {
        Some(jt) => Some(JoinTableSpec {
            name: require_str(jt, "name", "joinTable")
                .map_err(|_| CoreError::Spec(format!("relation '{name}': joinTable is missing 'name'")))?,
            join_column: str_or(jt, &["joinColumn"], ""),
            inverse_join_column: str_or(jt, &["inverseJoinColumn"], ""),
        }),
        None => None,
    };

    Ok(RelationSpec {
        target: require_str(item, "target", "relation")
            .map_err(|_| CoreError::Spec(format!("relation '{name}': missing 'target'")))?,
        mapped_by: opt_str(item, "mappedBy"),
        join_column: opt_str(item, "joinColumn"),
        cascade: string_list(item, "cascade"),
        orphan_removal: get(item, "orphanRemoval")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        order_by: opt_str(item, "orderBy"),
        cardinality,
        join_table,
        name,
    })
}

fn parse_unique_groups(entity: &Mapping) -> Vec<Vec<String>> {
    let Some(groups) = get(entity, "uniqueConstraints").and_then(Value::as_sequence) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(Value::as_sequence)
        .map(|group| {
            group
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .collect()
}

fn parse_enum(item: &Mapping) -> Result<EnumSpec, CoreError> {
    let name = require_str(item, "name", "enum")?;
    let storage_token = str_or(item, &["storage"], "name");
    let storage = EnumStorage::from_token(&storage_token).ok_or_else(|| {
        CoreError::Spec(format!("enum '{name}': unknown storage mode '{storage_token}'"))
    })?;

    Ok(EnumSpec {
        constants: string_list(item, "constants"),
        storage,
        name,
    })
}

fn parse_dto(item: &Mapping) -> Result<DtoSpec, CoreError> {
    let name = require_str(item, "name", "dto")?;
    let kind_token = str_or(item, &["kind"], "request");
    let kind = DtoKind::from_token(&kind_token)
        .ok_or_else(|| CoreError::Spec(format!("dto '{name}': unknown kind '{kind_token}'")))?;

    let mut class_constraints = Vec::new();
    if let Some(list) = get(item, "constraints").and_then(Value::as_sequence) {
        for entry in list {
            let mapping = entry.as_mapping().ok_or_else(|| {
                CoreError::Spec(format!("dto '{name}': class constraint must be a mapping"))
            })?;
            class_constraints.push(parse_class_constraint(mapping, &name)?);
        }
    }

    Ok(DtoSpec {
        fields: parse_list(item, "fields", parse_field)?,
        class_constraints,
        kind,
        name,
    })
}

fn parse_class_constraint(
    item: &Mapping,
    dto: &str,
) -> Result<ClassConstraintSpec, CoreError> {
    let kind = str_or(item, &["type"], "");
    match kind.as_str() {
        "fieldMatch" => Ok(ClassConstraintSpec::FieldMatch {
            field: require_str(item, "field", "fieldMatch")?,
            other: require_str(item, "other", "fieldMatch")?,
        }),
        "conditionalRequired" => Ok(ClassConstraintSpec::ConditionalRequired {
            field: require_str(item, "field", "conditionalRequired")?,
            when_field: require_str(item, "whenField", "conditionalRequired")?,
            when_value: opt_str(item, "whenValue"),
        }),
        "scriptAssert" => Ok(ClassConstraintSpec::ScriptAssert {
            script: require_str(item, "script", "scriptAssert")?,
        }),
        other => Err(CoreError::Spec(format!(
            "dto '{dto}': unknown class constraint type '{other}'"
        ))),
    }
}

fn parse_mapper(item: &Mapping) -> Result<MapperSpec, CoreError> {
    Ok(MapperSpec {
        source: require_str(item, "source", "mapper")?,
        target: require_str(item, "target", "mapper")?,
        name: opt_str(item, "name"),
    })
}

// ---------------------------------------------------------------------------
// Generic tree helpers
// ---------------------------------------------------------------------------

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(Value::String(key.to_string()))
}

fn opt_str(map: &Mapping, key: &str) -> Option<String> {
    get(map, key).and_then(scalar_to_string)
}

fn opt_str_any(map: &Mapping, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| opt_str(map, key))
}

fn str_or(map: &Mapping, keys: &[&str], default: &str) -> String {
    opt_str_any(map, keys).unwrap_or_else(|| default.to_string())
}

fn require_str(map: &Mapping, key: &str, section: &str) -> Result<String, CoreError> {
    opt_str(map, key)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Spec(format!("{section} is missing required '{key}'")))
}

/// Render a scalar node as a string. Quoted and unquoted scalars are
/// treated alike so `version: 0.1` and `length: 80` behave as expected.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(map: &Mapping, key: &str) -> Vec<String> {
    get(map, key)
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(scalar_to_string).collect())
        .unwrap_or_default()
}

fn parse_list<T>(
    map: &Mapping,
    key: &str,
    parse: fn(&Mapping) -> Result<T, CoreError>,
) -> Result<Vec<T>, CoreError> {
    let Some(list) = get(map, key) else {
        return Ok(Vec::new());
    };
    let list = list
        .as_sequence()
        .ok_or_else(|| CoreError::Spec(format!("'{key}' must be a list")))?;

    list.iter()
        .map(|entry| {
            entry
                .as_mapping()
                .ok_or_else(|| CoreError::Spec(format!("'{key}' entries must be mappings")))
                .and_then(parse)
        })
        .collect()
}

fn parse_token<T>(
    map: &Mapping,
    key: &str,
    default: &str,
    from_token: fn(&str) -> Option<T>,
) -> Result<T, CoreError> {
    let token = str_or(map, &[key], default);
    from_token(&token).ok_or_else(|| CoreError::Spec(format!("unknown {key} '{token}'")))
}

/// Default base package: group id plus the artifact id stripped down to a
/// valid package segment.
fn default_base_package(group: &str, artifact: &str) -> String {
    let segment: String = artifact
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if segment.is_empty() {
        group.to_string()
    } else {
        format!("{group}.{segment}")
    }
}

/// Normalize a runtime version to its plain major number:
/// `"1.8"` → `"8"`, `"21.0.1"` → `"21"`, `"17"` → `"17"`.
fn normalize_runtime(version: &str) -> String {
    let trimmed = version.strip_prefix("1.").unwrap_or(version);
    let major: String = trimmed.chars().take_while(char::is_ascii_digit).collect();
    if major.is_empty() {
        "17".to_string()
    } else {
        major
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
