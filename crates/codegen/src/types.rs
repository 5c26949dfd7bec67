//! Declared type token resolution.
//!
//! Maps spec type tokens like `"Decimal"` or `"List<OrderLine>"` to a
//! target-language type plus the imports that type needs. Unknown tokens
//! pass through unchanged — they are user-defined types living in the
//! generated model package, or enum names resolved separately by the
//! entity/DTO compilers.

use specforge_core::spec::TargetLanguage;

/// A resolved target-language type with the imports it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub name: String,
    pub imports: Vec<String>,
    /// Whether the leaf token was found in the scalar table (false for
    /// pass-through user-defined types).
    pub known: bool,
}

impl ResolvedType {
    fn known(name: &str, imports: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            known: true,
        }
    }

    fn passthrough(name: &str) -> Self {
        Self {
            name: name.to_string(),
            imports: Vec::new(),
            known: false,
        }
    }
}

/// Resolve a declared type token for the given target language.
///
/// Parametrized containers (`List<T>`, `Set<T>`, `Map<K,V>`) are resolved
/// recursively: the element tokens go back through the scalar table and the
/// container contributes its own import where the language needs one.
pub fn resolve(token: &str, language: TargetLanguage) -> ResolvedType {
    let token = token.trim();

    if let Some((container, arguments)) = split_generic(token) {
        let resolved: Vec<ResolvedType> = arguments
            .iter()
            .map(|arg| resolve(arg, language))
            .collect();

        let mut imports: Vec<String> = resolved
            .iter()
            .flat_map(|r| r.imports.iter().cloned())
            .collect();
        if let Some(import) = container_import(container, language) {
            imports.push(import.to_string());
        }

        let rendered: Vec<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
        return ResolvedType {
            name: format!("{container}<{}>", rendered.join(", ")),
            imports,
            known: true,
        };
    }

    scalar(token, language)
}

/// The innermost element token of a possibly-parametrized declaration,
/// e.g. `"List<OrderLine>"` → `"OrderLine"`. Used by the compilers to
/// decide whether a field is enum- or object-typed.
pub fn leaf_token(token: &str) -> &str {
    match token.rfind('<') {
        Some(start) => {
            let inner = &token[start + 1..token.len() - 1];
            // For Map<K,V> the value type is the interesting leaf.
            inner.rsplit(',').next().unwrap_or(inner).trim()
        }
        None => token.trim(),
    }
}

fn split_generic(token: &str) -> Option<(&str, Vec<&str>)> {
    let open = token.find('<')?;
    if !token.ends_with('>') {
        return None;
    }
    let container = &token[..open];
    let inner = &token[open + 1..token.len() - 1];

    // Split on top-level commas only (Map<String, List<X>> keeps nesting intact).
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                arguments.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    arguments.push(inner[start..].trim());
    Some((container, arguments))
}

fn container_import(container: &str, language: TargetLanguage) -> Option<&'static str> {
    // Kotlin's collection interfaces are in the default namespace.
    if language == TargetLanguage::Kotlin {
        return None;
    }
    match container {
        "List" => Some("java.util.List"),
        "Set" => Some("java.util.Set"),
        "Map" => Some("java.util.Map"),
        _ => None,
    }
}

fn scalar(token: &str, language: TargetLanguage) -> ResolvedType {
    match language {
        TargetLanguage::Java => java_scalar(token),
        TargetLanguage::Kotlin => kotlin_scalar(token),
    }
}

fn java_scalar(token: &str) -> ResolvedType {
    match token {
        "String" | "Text" => ResolvedType::known("String", &[]),
        "Integer" | "Int" => ResolvedType::known("Integer", &[]),
        "Long" => ResolvedType::known("Long", &[]),
        "Short" => ResolvedType::known("Short", &[]),
        "Double" => ResolvedType::known("Double", &[]),
        "Float" => ResolvedType::known("Float", &[]),
        "Boolean" => ResolvedType::known("Boolean", &[]),
        "Decimal" | "BigDecimal" => {
            ResolvedType::known("BigDecimal", &["java.math.BigDecimal"])
        }
        "BigInteger" => ResolvedType::known("BigInteger", &["java.math.BigInteger"]),
        "Date" | "LocalDate" => ResolvedType::known("LocalDate", &["java.time.LocalDate"]),
        "DateTime" | "LocalDateTime" => {
            ResolvedType::known("LocalDateTime", &["java.time.LocalDateTime"])
        }
        "Timestamp" | "OffsetDateTime" => {
            ResolvedType::known("OffsetDateTime", &["java.time.OffsetDateTime"])
        }
        "Instant" => ResolvedType::known("Instant", &["java.time.Instant"]),
        "Time" | "LocalTime" => ResolvedType::known("LocalTime", &["java.time.LocalTime"]),
        "Duration" => ResolvedType::known("Duration", &["java.time.Duration"]),
        "UUID" | "Uuid" => ResolvedType::known("UUID", &["java.util.UUID"]),
        other => ResolvedType::passthrough(other),
    }
}

fn kotlin_scalar(token: &str) -> ResolvedType {
    match token {
        "String" | "Text" => ResolvedType::known("String", &[]),
        "Integer" | "Int" => ResolvedType::known("Int", &[]),
        "Long" => ResolvedType::known("Long", &[]),
        "Short" => ResolvedType::known("Short", &[]),
        "Double" => ResolvedType::known("Double", &[]),
        "Float" => ResolvedType::known("Float", &[]),
        "Boolean" => ResolvedType::known("Boolean", &[]),
        "Decimal" | "BigDecimal" => {
            ResolvedType::known("BigDecimal", &["java.math.BigDecimal"])
        }
        "BigInteger" => ResolvedType::known("BigInteger", &["java.math.BigInteger"]),
        "Date" | "LocalDate" => ResolvedType::known("LocalDate", &["java.time.LocalDate"]),
        "DateTime" | "LocalDateTime" => {
            ResolvedType::known("LocalDateTime", &["java.time.LocalDateTime"])
        }
        "Timestamp" | "OffsetDateTime" => {
            ResolvedType::known("OffsetDateTime", &["java.time.OffsetDateTime"])
        }
        "Instant" => ResolvedType::known("Instant", &["java.time.Instant"]),
        "Time" | "LocalTime" => ResolvedType::known("LocalTime", &["java.time.LocalTime"]),
        "Duration" => ResolvedType::known("Duration", &["java.time.Duration"]),
        "UUID" | "Uuid" => ResolvedType::known("UUID", &["java.util.UUID"]),
        other => ResolvedType::passthrough(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
