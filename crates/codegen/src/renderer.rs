//! Template rendering for generation units.
//!
//! Templates are embedded in the binary and registered once per
//! [`Renderer`]. Rendering tries an ordered list of template-path
//! candidates so a target-language-specific template wins over the shared
//! fallback. Escaping is disabled — the output is source code, not HTML.

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::{handlebars_helper, Handlebars};
use specforge_core::casing::{to_lower_camel, to_upper_camel};
use specforge_core::spec::TargetLanguage;

use crate::error::CodegenError;
use crate::imports::inject_imports;
use crate::packages::package_to_path;
use crate::unit::GenerationUnit;

/// All embedded templates, keyed by candidate path.
const TEMPLATES: &[(&str, &str)] = &[
    ("java/entity", include_str!("templates/java/entity.hbs")),
    ("java/enum", include_str!("templates/java/enum.hbs")),
    ("java/dto", include_str!("templates/java/dto.hbs")),
    ("java/repository", include_str!("templates/java/repository.hbs")),
    ("java/service", include_str!("templates/java/service.hbs")),
    ("java/controller", include_str!("templates/java/controller.hbs")),
    ("java/mapper", include_str!("templates/java/mapper.hbs")),
    ("java/application", include_str!("templates/java/application.hbs")),
    (
        "java/not_found_exception",
        include_str!("templates/java/not_found_exception.hbs"),
    ),
    ("java/field_match", include_str!("templates/java/field_match.hbs")),
    (
        "java/conditional_required",
        include_str!("templates/java/conditional_required.hbs"),
    ),
    ("java/script_assert", include_str!("templates/java/script_assert.hbs")),
    (
        "java/sequence_listener",
        include_str!("templates/java/sequence_listener.hbs"),
    ),
    ("java/openapi_config", include_str!("templates/java/openapi_config.hbs")),
    ("kotlin/entity", include_str!("templates/kotlin/entity.hbs")),
    ("kotlin/enum", include_str!("templates/kotlin/enum.hbs")),
    ("kotlin/dto", include_str!("templates/kotlin/dto.hbs")),
    ("kotlin/repository", include_str!("templates/kotlin/repository.hbs")),
    ("kotlin/service", include_str!("templates/kotlin/service.hbs")),
    ("kotlin/controller", include_str!("templates/kotlin/controller.hbs")),
    ("kotlin/mapper", include_str!("templates/kotlin/mapper.hbs")),
    ("kotlin/application", include_str!("templates/kotlin/application.hbs")),
    (
        "kotlin/not_found_exception",
        include_str!("templates/kotlin/not_found_exception.hbs"),
    ),
    ("kotlin/field_match", include_str!("templates/kotlin/field_match.hbs")),
    (
        "kotlin/conditional_required",
        include_str!("templates/kotlin/conditional_required.hbs"),
    ),
    ("kotlin/script_assert", include_str!("templates/kotlin/script_assert.hbs")),
    (
        "kotlin/sequence_listener",
        include_str!("templates/kotlin/sequence_listener.hbs"),
    ),
    (
        "kotlin/openapi_config",
        include_str!("templates/kotlin/openapi_config.hbs"),
    ),
    ("common/pom", include_str!("templates/common/pom.hbs")),
    ("common/build_gradle", include_str!("templates/common/build_gradle.hbs")),
    (
        "common/build_gradle_kts",
        include_str!("templates/common/build_gradle_kts.hbs"),
    ),
    (
        "common/settings_gradle",
        include_str!("templates/common/settings_gradle.hbs"),
    ),
    (
        "common/settings_gradle_kts",
        include_str!("templates/common/settings_gradle_kts.hbs"),
    ),
];

handlebars_helper!(pascal: |s: String| to_upper_camel(&s));
handlebars_helper!(camel: |s: String| to_lower_camel(&s));

/// Renders named templates against a unit's model map.
pub struct Renderer {
    hb: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Self {
        let mut hb = Handlebars::new();
        hb.register_escape_fn(handlebars::no_escape);
        hb.register_helper("pascal", Box::new(pascal));
        hb.register_helper("camel", Box::new(camel));
        for (name, content) in TEMPLATES {
            // Embedded templates are compile-time constants; registration
            // cannot fail for well-formed template text.
            hb.register_template_string(name, *content)
                .unwrap_or_else(|e| panic!("invalid embedded template '{name}': {e}"));
        }
        Self { hb }
    }

    /// Render the first template candidate that resolves.
    pub fn render(
        &self,
        candidates: &[String],
        model: &serde_json::Value,
    ) -> Result<String, CodegenError> {
        for candidate in candidates {
            if self.hb.has_template(candidate) {
                return Ok(self.hb.render(candidate, model)?);
            }
        }
        Err(CodegenError::TemplateNotFound(candidates.join(", ")))
    }

    /// Render a unit and splice in its import block.
    pub fn render_unit(
        &self,
        unit: &GenerationUnit,
        base_package: &str,
        language: TargetLanguage,
    ) -> Result<String, CodegenError> {
        let body = self.render(&unit.templates, &unit.model)?;
        Ok(inject_imports(&body, &unit.imports, base_package, language))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of a unit's source file under the working directory.
pub fn source_path(work_dir: &Path, language: TargetLanguage, unit: &GenerationUnit) -> PathBuf {
    work_dir
        .join("src/main")
        .join(language.source_dir())
        .join(package_to_path(&unit.package))
        .join(format!("{}.{}", unit.class_name, language.extension()))
}

/// Render a unit and write it to its place in the source tree. Returns the
/// written path.
pub fn write_unit(
    renderer: &Renderer,
    work_dir: &Path,
    base_package: &str,
    language: TargetLanguage,
    unit: &GenerationUnit,
) -> Result<PathBuf, CodegenError> {
    let content = renderer.render_unit(unit, base_package, language)?;
    let path = source_path(work_dir, language, unit);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_candidates_fail_with_template_not_found() {
        let renderer = Renderer::new();
        let err = renderer
            .render(&["java/nope".to_string(), "common/nope".to_string()], &json!({}))
            .unwrap_err();
        assert!(matches!(err, CodegenError::TemplateNotFound(_)));
    }

    #[test]
    fn first_resolving_candidate_wins() {
        let renderer = Renderer::new();
        // "kotlin/pom" does not exist; the shared fallback does.
        let result = renderer.render(
            &["kotlin/pom".to_string(), "common/pom".to_string()],
            &json!({
                "group": "com.x", "artifact": "demo", "version": "1.0",
                "name": "demo", "description": "", "runtimeVersion": "17",
                "packaging": "jar", "bootVersion": "3.4.1",
                "dependencies": [], "processors": [], "war": false,
            }),
        );
        assert!(result.unwrap().contains("<artifactId>demo</artifactId>"));
    }

    #[test]
    fn source_path_follows_package_layout() {
        let unit = GenerationUnit::new("com.x.demo.model", "Order", vec![]);
        let path = source_path(Path::new("/tmp/w"), TargetLanguage::Java, &unit);
        assert_eq!(
            path,
            Path::new("/tmp/w/src/main/java/com/x/demo/model/Order.java")
        );
    }
}
