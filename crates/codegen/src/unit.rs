//! Compiler output model.
//!
//! A [`GenerationUnit`] is the intermediate representation of one emitted
//! artifact (class). Compilers build units; the renderer consumes them
//! immediately. Units are never persisted.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::json;
use specforge_core::spec::{
    ApplicationSpec, BoilerplateStyle, Datastore, EnumStorage, PackageLayout, TargetLanguage,
};

/// Inputs shared by every per-artifact compiler.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub base_package: String,
    pub layout: PackageLayout,
    pub language: TargetLanguage,
    pub boilerplate: BoilerplateStyle,
    pub datastore: Datastore,
    pub pluralize_tables: bool,
    /// Declared enums by name, for resolving enum-typed fields.
    pub enums: BTreeMap<String, EnumStorage>,
}

impl CompileOptions {
    pub fn from_spec(spec: &ApplicationSpec) -> Self {
        Self {
            base_package: spec.base_package.clone(),
            layout: spec.layout,
            language: spec.language,
            boilerplate: spec.boilerplate,
            datastore: spec.datastore,
            pluralize_tables: spec.pluralize_tables,
            enums: spec
                .enums
                .iter()
                .map(|e| (e.name.clone(), e.storage))
                .collect(),
        }
    }

    /// Lombok only applies to Java sources; Kotlin needs no accessor
    /// generation either way.
    pub fn uses_lombok(&self) -> bool {
        self.boilerplate == BoilerplateStyle::GeneratedAccessors
            && self.language == TargetLanguage::Java
    }
}

/// One rendered property block: annotation lines above a declaration.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyModel {
    pub annotations: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    /// Optional initializer expression (e.g. `new HashSet<>()`).
    pub initializer: Option<String>,
}

/// Intermediate representation of one emitted artifact.
#[derive(Debug, Clone)]
pub struct GenerationUnit {
    pub package: String,
    pub class_name: String,
    /// Ordered template-path candidates, most specific first.
    pub templates: Vec<String>,
    pub imports: BTreeSet<String>,
    /// Handlebars model. Always carries `package` and `className`.
    pub model: serde_json::Value,
    /// Message-catalog fragment: validation key → default text.
    pub messages: Vec<(String, String)>,
}

impl GenerationUnit {
    pub fn new(
        package: impl Into<String>,
        class_name: impl Into<String>,
        templates: Vec<String>,
    ) -> Self {
        let package = package.into();
        let class_name = class_name.into();
        let model = json!({
            "package": package,
            "className": class_name,
        });
        Self {
            package,
            class_name,
            templates,
            imports: BTreeSet::new(),
            model,
            messages: Vec::new(),
        }
    }

    pub fn add_import(&mut self, import: impl Into<String>) {
        self.imports.insert(import.into());
    }

    pub fn add_imports<I: IntoIterator<Item = String>>(&mut self, imports: I) {
        self.imports.extend(imports);
    }

    /// Set a model entry for the templates.
    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.model[key] = value;
    }

    pub fn set_properties(&mut self, properties: &[PropertyModel]) {
        self.model["properties"] = serde_json::to_value(properties).unwrap_or_default();
    }
}

/// Template candidates for an artifact: the language-specific template
/// first, then the shared fallback.
pub fn template_candidates(language: TargetLanguage, name: &str) -> Vec<String> {
    let dir = match language {
        TargetLanguage::Java => "java",
        TargetLanguage::Kotlin => "kotlin",
    };
    vec![format!("{dir}/{name}"), format!("common/{name}")]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
