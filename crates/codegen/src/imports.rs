//! Import block assembly and injection.
//!
//! Collected imports are partitioned into four groups — host standard
//! library, framework/accessor-generation, third-party, project-internal —
//! each sorted and blank-line-separated, then spliced immediately after the
//! rendered file's package declaration.

use std::collections::BTreeSet;

use specforge_core::spec::TargetLanguage;

/// Build the grouped import block for a source file. Returns an empty
/// string when there are no imports.
pub fn import_block(
    imports: &BTreeSet<String>,
    base_package: &str,
    language: TargetLanguage,
) -> String {
    let mut std_lib = Vec::new();
    let mut framework = Vec::new();
    let mut third_party = Vec::new();
    let mut internal = Vec::new();

    let internal_prefix = format!("{base_package}.");
    for import in imports {
        if import.starts_with("java.")
            || import.starts_with("javax.")
            || import.starts_with("jakarta.")
        {
            std_lib.push(import.as_str());
        } else if import.starts_with("org.springframework.") || import.starts_with("lombok.") {
            framework.push(import.as_str());
        } else if import.starts_with(&internal_prefix) {
            internal.push(import.as_str());
        } else {
            third_party.push(import.as_str());
        }
    }

    let terminator = match language {
        TargetLanguage::Java => ";",
        TargetLanguage::Kotlin => "",
    };

    let groups = [std_lib, framework, third_party, internal];
    let blocks: Vec<String> = groups
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            group
                .iter()
                .map(|import| format!("import {import}{terminator}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    blocks.join("\n\n")
}

/// Splice the import block into a rendered file, immediately after the
/// package declaration. Files without a package declaration get the block
/// prepended.
pub fn inject_imports(
    rendered: &str,
    imports: &BTreeSet<String>,
    base_package: &str,
    language: TargetLanguage,
) -> String {
    let block = import_block(imports, base_package, language);
    if block.is_empty() {
        return rendered.to_string();
    }

    match rendered.lines().next() {
        Some(first) if first.starts_with("package ") => {
            let rest = &rendered[first.len()..];
            let rest = rest.strip_prefix('\n').unwrap_or(rest);
            format!("{first}\n\n{block}\n{rest}")
        }
        _ => format!("{block}\n\n{rendered}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
