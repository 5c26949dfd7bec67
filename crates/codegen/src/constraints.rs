//! Field constraint → validation annotation mapping.
//!
//! Shared by the entity and DTO compilers. Each known constraint kind maps
//! to a `jakarta.validation` annotation; parameters are rendered in a fixed
//! order so generated output is deterministic. Unknown kinds are skipped
//! (the compiler logs them).

use specforge_core::spec::ConstraintSpec;

/// A constraint rendered as an annotation line plus its imports and an
/// optional message-catalog entry.
#[derive(Debug, Clone)]
pub struct BuiltConstraint {
    pub annotation: String,
    pub imports: Vec<String>,
    /// `(key, default text)` when the constraint carries a message key.
    pub message: Option<(String, String)>,
}

/// Known constraint kinds: annotation simple name, import, ordered
/// parameter names, whether a parameter is rendered as a string literal.
const KINDS: &[(&str, &[(&str, bool)])] = &[
    ("NotNull", &[]),
    ("NotBlank", &[]),
    ("NotEmpty", &[]),
    ("Email", &[]),
    ("Size", &[("min", false), ("max", false)]),
    ("Min", &[("value", false)]),
    ("Max", &[("value", false)]),
    ("DecimalMin", &[("value", true)]),
    ("DecimalMax", &[("value", true)]),
    ("Digits", &[("integer", false), ("fraction", false)]),
    ("Pattern", &[("regexp", true)]),
    ("Positive", &[]),
    ("PositiveOrZero", &[]),
    ("Negative", &[]),
    ("NegativeOrZero", &[]),
    ("Past", &[]),
    ("PastOrPresent", &[]),
    ("Future", &[]),
    ("FutureOrPresent", &[]),
    ("AssertTrue", &[]),
    ("AssertFalse", &[]),
];

/// Build the annotation for a declared constraint, or `None` for unknown
/// kinds.
pub fn build_constraint(constraint: &ConstraintSpec) -> Option<BuiltConstraint> {
    let (kind, params) = KINDS
        .iter()
        .find(|(name, _)| *name == constraint.kind)?;

    let mut arguments = Vec::new();
    for (param, quoted) in params.iter() {
        if let Some(value) = constraint.params.get(*param) {
            if *quoted {
                arguments.push(format!("{param} = \"{}\"", escape(value)));
            } else {
                arguments.push(format!("{param} = {value}"));
            }
        }
    }

    let message = constraint
        .message
        .as_ref()
        .map(|key| (key.clone(), default_text(kind, constraint)));
    if let Some((key, _)) = &message {
        arguments.push(format!("message = \"{{{key}}}\""));
    }

    let annotation = if arguments.is_empty() {
        format!("@{kind}")
    } else {
        format!("@{kind}({})", arguments.join(", "))
    };

    Some(BuiltConstraint {
        annotation,
        imports: vec![format!("jakarta.validation.constraints.{kind}")],
        message,
    })
}

/// Infer a column length from a `Size`-style constraint's `max` parameter.
pub fn inferred_length(constraints: &[ConstraintSpec]) -> Option<u32> {
    constraints
        .iter()
        .filter(|c| c.kind == "Size")
        .find_map(|c| c.params.get("max").and_then(|v| v.parse().ok()))
}

/// Default catalog text mirroring the bean-validation wording.
fn default_text(kind: &str, constraint: &ConstraintSpec) -> String {
    let param = |name: &str| constraint.params.get(name).cloned().unwrap_or_default();
    match kind {
        "NotNull" => "must not be null".to_string(),
        "NotBlank" => "must not be blank".to_string(),
        "NotEmpty" => "must not be empty".to_string(),
        "Email" => "must be a well-formed email address".to_string(),
        "Size" => format!(
            "size must be between {} and {}",
            constraint.params.get("min").cloned().unwrap_or_else(|| "0".to_string()),
            param("max")
        ),
        "Min" | "DecimalMin" => {
            format!("must be greater than or equal to {}", param("value"))
        }
        "Max" | "DecimalMax" => {
            format!("must be less than or equal to {}", param("value"))
        }
        "Pattern" => format!("must match \"{}\"", param("regexp")),
        "Past" => "must be a past date".to_string(),
        "Future" => "must be a future date".to_string(),
        _ => "invalid value".to_string(),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
