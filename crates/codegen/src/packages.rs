//! Package naming shared by all compilers.
//!
//! Under the "technical" layout artifacts land in `<base>.<kind>`; under the
//! "domain" layout entity-scoped artifacts land in
//! `<base>.domain.<normalized-entity-name>.<kind>` while DTOs stay under
//! `.dto.*` and enums stay in the shared model package.

use specforge_core::casing::to_lower_snake;
use specforge_core::spec::PackageLayout;

/// Artifact kinds that map to a package segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Repository,
    Service,
    Controller,
    Config,
    Util,
}

impl ArtifactKind {
    fn segment(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Repository => "repository",
            Self::Service => "service",
            Self::Controller => "controller",
            Self::Config => "config",
            Self::Util => "util",
        }
    }
}

/// Package for an entity-scoped artifact.
pub fn package_for(
    base: &str,
    layout: PackageLayout,
    kind: ArtifactKind,
    entity: Option<&str>,
) -> String {
    match (layout, entity) {
        (PackageLayout::Domain, Some(entity)) => {
            format!("{base}.domain.{}.{}", normalize_entity_name(entity), kind.segment())
        }
        _ => format!("{base}.{}", kind.segment()),
    }
}

/// Package for a DTO artifact. DTOs stay under `.dto.*` in both layouts.
pub fn dto_package(base: &str, sub: &str) -> String {
    format!("{base}.dto.{sub}")
}

/// Normalize an entity name into a package segment: lower-snake it, strip
/// characters that are not valid in an identifier, and prefix a filler if
/// the result would not start with a valid identifier character.
pub fn normalize_entity_name(name: &str) -> String {
    let snake = to_lower_snake(name);
    let cleaned: String = snake
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    match cleaned.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => cleaned,
        Some(_) => format!("p{cleaned}"),
        None => "p".to_string(),
    }
}

/// Convert a dotted package name to a relative filesystem path.
pub fn package_to_path(package: &str) -> String {
    package.replace('.', "/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
