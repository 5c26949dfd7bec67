//! Typed application spec model.
//!
//! [`ApplicationSpec`] is built once per run by [`parser::parse_spec`] and is
//! read-only during compilation. Parsing and invariant validation live in the
//! [`parser`] and [`validate`] submodules.

pub mod parser;
pub mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Option enums
// ---------------------------------------------------------------------------

/// Build tool plus DSL flavour for the generated build descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildTool {
    Maven,
    Gradle,
    GradleKotlin,
}

impl BuildTool {
    /// Parse the spec token. Accepts the DSL variant spelled either way.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "maven" => Some(Self::Maven),
            "gradle" | "gradle-groovy" => Some(Self::Gradle),
            "gradle-kotlin" | "gradle-kts" => Some(Self::GradleKotlin),
            _ => None,
        }
    }
}

/// Target language of the generated source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLanguage {
    Java,
    Kotlin,
}

impl TargetLanguage {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "java" => Some(Self::Java),
            "kotlin" => Some(Self::Kotlin),
            _ => None,
        }
    }

    /// Source file extension for this language.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kt",
        }
    }

    /// Directory name under `src/main/` for this language.
    pub fn source_dir(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kotlin",
        }
    }
}

/// How generated artifacts are grouped into packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageLayout {
    /// Group by artifact kind: `<base>.model`, `<base>.service`, ...
    Technical,
    /// Group by entity: `<base>.domain.<entity>.<kind>`; DTOs stay in `.dto.*`.
    Domain,
}

impl PackageLayout {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "technical" => Some(Self::Technical),
            "domain" => Some(Self::Domain),
            _ => None,
        }
    }
}

/// Whether accessors/constructors/equality are emitted as native source or
/// delegated to an annotation-driven generator (Lombok).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoilerplateStyle {
    GeneratedAccessors,
    Plain,
}

impl BoilerplateStyle {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "generated-accessors" | "generatedAccessors" | "lombok" => {
                Some(Self::GeneratedAccessors)
            }
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Target datastore. Drives the driver dependency, the persistence
/// annotation set (relational vs document), and the compose file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datastore {
    None,
    Postgres,
    Mysql,
    Mariadb,
    Mssql,
    H2,
    Mongodb,
}

impl Datastore {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" => Some(Self::Mysql),
            "mariadb" => Some(Self::Mariadb),
            "mssql" | "sqlserver" => Some(Self::Mssql),
            "h2" => Some(Self::H2),
            "mongodb" | "mongo" => Some(Self::Mongodb),
            _ => None,
        }
    }

    /// Document stores get the non-relational annotation set.
    pub fn is_document(self) -> bool {
        matches!(self, Self::Mongodb)
    }
}

/// Archive packaging of the generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packaging {
    Jar,
    War,
}

impl Packaging {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "jar" => Some(Self::Jar),
            "war" => Some(Self::War),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::War => "war",
        }
    }
}

/// Surrogate id generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdStrategy {
    Identity,
    Sequence,
    Uuid,
    Auto,
    None,
}

impl IdStrategy {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "sequence" => Some(Self::Sequence),
            "uuid" => Some(Self::Uuid),
            "auto" => Some(Self::Auto),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Relation cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1:1" | "one-to-one" => Some(Self::OneToOne),
            "1:N" | "1:n" | "one-to-many" => Some(Self::OneToMany),
            "N:1" | "n:1" | "many-to-one" => Some(Self::ManyToOne),
            "N:N" | "n:n" | "N:M" | "many-to-many" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// True for the collection-valued side of the relation.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// How an enum-typed field is stored in the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumStorage {
    Ordinal,
    Name,
}

impl EnumStorage {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ordinal" => Some(Self::Ordinal),
            "name" | "string" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Request vs response side of a DTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtoKind {
    Request,
    Response,
}

impl DtoKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "request" => Some(Self::Request),
            "response" => Some(Self::Response),
            _ => None,
        }
    }

    /// Sub-package under `.dto` for this kind.
    pub fn sub_package(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

// ---------------------------------------------------------------------------
// Spec structs
// ---------------------------------------------------------------------------

/// Build metadata from the required `app` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMeta {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub build_tool: BuildTool,
    pub packaging: Packaging,
    /// Target JVM runtime version, normalized to a plain major number
    /// (e.g. `"17"`).
    pub runtime_version: String,
}

/// Root of the parsed spec. Read-only during compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSpec {
    pub app: AppMeta,
    pub base_package: String,
    pub layout: PackageLayout,
    pub language: TargetLanguage,
    pub boilerplate: BoilerplateStyle,
    pub datastore: Datastore,
    pub openapi: bool,
    pub container_compose: bool,
    pub pluralize_tables: bool,
    pub entities: Vec<EntitySpec>,
    pub enums: Vec<EnumSpec>,
    pub dtos: Vec<DtoSpec>,
    pub mappers: Vec<MapperSpec>,
    /// Extra dependency tokens (aliases or raw `group:artifact[:scope]`).
    pub dependencies: Vec<String>,
}

impl ApplicationSpec {
    /// Look up a declared enum by its exact name.
    pub fn find_enum(&self, name: &str) -> Option<&EnumSpec> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Look up a declared entity by name, case-insensitively.
    pub fn find_entity(&self, name: &str) -> Option<&EntitySpec> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Look up a declared DTO by its exact name.
    pub fn find_dto(&self, name: &str) -> Option<&DtoSpec> {
        self.dtos.iter().find(|d| d.name == name)
    }
}

/// Surrogate id descriptor of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdSpec {
    pub field: String,
    pub type_token: String,
    pub strategy: IdStrategy,
}

/// One persistent entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub table: Option<String>,
    pub schema: Option<String>,
    pub id: IdSpec,
    pub fields: Vec<FieldSpec>,
    pub relations: Vec<RelationSpec>,
    /// Composite unique constraints, each a group of column-level field names.
    pub unique_groups: Vec<Vec<String>>,
    pub auditing: bool,
    pub soft_delete: bool,
    pub immutable: bool,
    /// Whether a REST resource (repository/service/controller) is generated.
    pub rest: bool,
}

/// One scalar or collection-typed field of an entity or DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Declared type token, e.g. `"String"`, `"Decimal"`, `"List<OrderLine>"`.
    pub type_token: String,
    pub constraints: Vec<ConstraintSpec>,
    pub column: ColumnSpec,
    pub natural_id: bool,
}

/// One declared validation constraint on a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    /// Constraint kind, e.g. `"NotNull"`, `"Size"`, `"Email"`.
    pub kind: String,
    /// Constraint parameters, e.g. `max -> "255"`. Ordered for determinism.
    pub params: BTreeMap<String, String>,
    /// Optional message catalog key overriding the generated default.
    pub message: Option<String>,
}

/// Physical column properties of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: Option<String>,
    pub length: Option<u32>,
    pub nullable: bool,
    pub unique: bool,
    /// Raw column definition override, passed through verbatim.
    pub definition: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: None,
            length: None,
            nullable: true,
            unique: false,
            definition: None,
        }
    }
}

/// Join table descriptor for the owning side of an N:N relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinTableSpec {
    pub name: String,
    pub join_column: String,
    pub inverse_join_column: String,
}

/// One relation between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub name: String,
    pub cardinality: Cardinality,
    pub target: String,
    /// Inverse-side field name (`mappedBy`). Required for 1:N.
    pub mapped_by: Option<String>,
    /// Join column name for the owning side of scalar-valued relations.
    pub join_column: Option<String>,
    /// Join table descriptor. Required for the owning side of N:N.
    pub join_table: Option<JoinTableSpec>,
    pub cascade: Vec<String>,
    pub orphan_removal: bool,
    /// Ordering hint rendered into an `@OrderBy` annotation.
    pub order_by: Option<String>,
}

/// One declared enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSpec {
    pub name: String,
    pub constants: Vec<String>,
    pub storage: EnumStorage,
}

/// Class-level cross-field constraint on a DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassConstraintSpec {
    /// Two fields must hold the same value (e.g. password confirmation).
    FieldMatch { field: String, other: String },
    /// `field` is required when `when_field` holds `when_value` (or any
    /// non-null value if `when_value` is `None`).
    ConditionalRequired {
        field: String,
        when_field: String,
        when_value: Option<String>,
    },
    /// A raw script expression evaluated against the whole object.
    ScriptAssert { script: String },
}

/// One declared DTO class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtoSpec {
    pub name: String,
    pub kind: DtoKind,
    pub fields: Vec<FieldSpec>,
    pub class_constraints: Vec<ClassConstraintSpec>,
}

/// One declared source/target mapper pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperSpec {
    pub source: String,
    pub target: String,
    /// Explicit mapper class name; derived from the pair when absent.
    pub name: Option<String>,
}
