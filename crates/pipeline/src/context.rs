//! The shared mutable context threaded through every pipeline stage.
//!
//! Well-known data has typed fields and accessors; stage-to-stage ad hoc
//! data goes through the string-keyed detail map, which the driver merges
//! after every successful stage.

use std::collections::BTreeMap;
use std::path::PathBuf;

use specforge_codegen::unit::CompileOptions;
use specforge_core::spec::ApplicationSpec;

/// Mutable state owned by exactly one run's execution, discarded at
/// completion.
#[derive(Debug)]
pub struct GenerationContext {
    /// Working directory all stages write under.
    pub work_dir: PathBuf,
    /// The parsed spec; read-only during compilation.
    pub spec: ApplicationSpec,
    /// Compiler inputs derived from the spec once at seed time.
    pub options: CompileOptions,
    /// Collected message-catalog fragments, merged by the app-files stage.
    pub messages: Vec<(String, String)>,
    /// Dependency tokens added by stages (e.g. the OpenAPI starter),
    /// consumed by the scaffold stage.
    pub extra_dependencies: Vec<String>,
    /// String-keyed overflow map for ad hoc stage-to-stage data.
    pub details: BTreeMap<String, String>,
    /// The first stage failure, if any.
    pub error: Option<String>,
}

impl GenerationContext {
    pub fn new(work_dir: PathBuf, spec: ApplicationSpec) -> Self {
        let options = CompileOptions::from_spec(&spec);
        Self {
            work_dir,
            spec,
            options,
            messages: Vec::new(),
            extra_dependencies: Vec::new(),
            details: BTreeMap::new(),
            error: None,
        }
    }

    pub fn insert_detail(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.details.insert(key.into(), value.into());
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    /// A boolean detail: set and equal to `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.detail(key) == Some("true")
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
    fn details_round_trip() {
        let spec = parse_spec("app: {}\n").unwrap();
        let mut ctx = GenerationContext::new(PathBuf::from("/tmp/w"), spec);
        assert!(ctx.detail("actuator").is_none());
        assert!(!ctx.flag("actuator"));

        ctx.insert_detail("actuator", "true");
        assert_eq!(ctx.detail("actuator"), Some("true"));
        assert!(ctx.flag("actuator"));
    }
}
