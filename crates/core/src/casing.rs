//! Identifier case conversion between the spec's input case and the three
//! output conventions used by generated code: lower_snake (physical
//! columns/tables), lowerCamel (members), UpperCamel (types), plus
//! kebab-case for endpoint paths.
//!
//! All conversions are pure and locale-independent. For identifiers built
//! from ASCII letters, digits and underscores the conversions agree with
//! each other: `to_upper_camel(to_lower_snake(x)) == to_upper_camel(x)`.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

// ---------------------------------------------------------------------------
// Case conversion
// ---------------------------------------------------------------------------

/// Convert an identifier to lower_snake_case (tables, columns).
pub fn to_lower_snake(input: &str) -> String {
    input.to_snake_case()
}

/// Convert an identifier to lowerCamelCase (members, variables).
pub fn to_lower_camel(input: &str) -> String {
    input.to_lower_camel_case()
}

/// Convert an identifier to UpperCamelCase (class and type names).
pub fn to_upper_camel(input: &str) -> String {
    input.to_upper_camel_case()
}

/// Convert an identifier to kebab-case (REST endpoint paths).
pub fn to_kebab(input: &str) -> String {
    input.to_kebab_case()
}

// ---------------------------------------------------------------------------
// Pluralization
// ---------------------------------------------------------------------------

/// Irregular plural forms that the suffix rules below would get wrong.
const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
];

/// Pluralize the final word of a lower-cased identifier.
///
/// Used for table names (`pluralize-table-names` option) and endpoint
/// paths. Operates on the last `_`- or `-`-separated word so that
/// `order_item` becomes `order_items` and `delivery-person` becomes
/// `delivery-people`.
pub fn pluralize(input: &str) -> String {
    let split = input.rfind(['_', '-']).map(|i| i + 1).unwrap_or(0);
    let (head, word) = input.split_at(split);

    if word.is_empty() {
        return input.to_string();
    }

    for (singular, plural) in IRREGULARS {
        if word == *singular {
            return format!("{head}{plural}");
        }
    }

    let plural = if word.ends_with("ch")
        || word.ends_with("sh")
        || word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
    {
        format!("{word}es")
    } else if word.ends_with('y') && !ends_with_vowel_y(word) {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    };

    format!("{head}{plural}")
}

/// True when the identifier ends in a vowel followed by `y` (e.g. "key"),
/// in which case the plural is a plain `s`.
fn ends_with_vowel_y(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    matches!(bytes[bytes.len() - 2], b'a' | b'e' | b'i' | b'o' | b'u')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- case conversion --

    #[test]
    fn upper_camel_from_snake() {
        assert_eq!(to_upper_camel("order_item"), "OrderItem");
    }

    #[test]
    fn upper_camel_from_camel() {
        assert_eq!(to_upper_camel("orderItem"), "OrderItem");
    }

    #[test]
    fn lower_snake_from_upper_camel() {
        assert_eq!(to_lower_snake("OrderItem"), "order_item");
    }

    #[test]
    fn lower_camel_from_upper_camel() {
        assert_eq!(to_lower_camel("OrderItem"), "orderItem");
    }

    #[test]
    fn kebab_from_upper_camel() {
        assert_eq!(to_kebab("OrderItem"), "order-item");
    }

    #[test]
    fn digits_are_preserved() {
        assert_eq!(to_lower_snake("Address2Line"), "address2_line");
        assert_eq!(to_upper_camel("address2_line"), "Address2Line");
    }

    #[test]
    fn round_trip_through_snake_is_stable() {
        for ident in [
            "Order",
            "orderItem",
            "OrderItem",
            "order_item",
            "HTTPServer",
            "customer2",
            "a_b_c",
            "alreadysnake",
        ] {
            assert_eq!(
                to_upper_camel(&to_lower_snake(ident)),
                to_upper_camel(ident),
                "round trip failed for {ident}"
            );
        }
    }

    // -- pluralization --

    #[test]
    fn plain_plural() {
        assert_eq!(pluralize("order"), "orders");
    }

    #[test]
    fn es_after_sibilant() {
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("batch"), "batches");
    }

    #[test]
    fn consonant_y_becomes_ies() {
        assert_eq!(pluralize("category"), "categories");
    }

    #[test]
    fn vowel_y_takes_plain_s() {
        assert_eq!(pluralize("key"), "keys");
    }

    #[test]
    fn irregular_plural() {
        assert_eq!(pluralize("person"), "people");
    }

    #[test]
    fn only_last_word_is_pluralized() {
        assert_eq!(pluralize("order_item"), "order_items");
        assert_eq!(pluralize("delivery-person"), "delivery-people");
    }

    #[test]
    fn empty_input_unchanged() {
        assert_eq!(pluralize(""), "");
    }
}
