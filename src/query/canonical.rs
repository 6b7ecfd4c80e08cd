//! Identifier-access canonicalization
//!
//! Models keep emitting the deprecated `id(x)` family even when told to
//! use `elementId(x)`. This rewrite is applied after validation and again
//! before every execution, since a repair may bring the old form back.

use regex_lite::Regex;
use std::sync::OnceLock;

/// The canonical identifier-access function.
pub const CANONICAL_ID_FUNCTION: &str = "elementId";

const REPLACEMENT: &str = "elementId(${arg})";

/// Deprecated call forms, applied in order:
/// 1. `id(x)`
/// 2. `ID(x)` / `ID (x)`
/// 3. any casing with whitespace before the parenthesis (`Id (x)`, `id  (x)`)
fn deprecated_forms() -> &'static [Regex] {
    static FORMS: OnceLock<Vec<Regex>> = OnceLock::new();
    FORMS.get_or_init(|| {
        [
            r"\bid\((?P<arg>[^)]+)\)",
            r"\bID\s*\((?P<arg>[^)]+)\)",
            r"(?i)\bid\s*\((?P<arg>[^)]+)\)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("identifier-access patterns are valid"))
        .collect()
    })
}

/// Rewrite deprecated identifier-access calls to `elementId(..)`.
///
/// The argument text is kept as-is and nothing else in the query changes.
/// Nested calls such as `id(id(x))` can hide an inner match behind an
/// outer one, so passes repeat until no form matches. Every pass removes at
/// least one deprecated call, and the output contains none, which makes the
/// rewrite idempotent.
pub fn canonicalize(query: &str) -> String {
    let mut out = query.to_string();
    loop {
        let mut changed = false;
        for form in deprecated_forms() {
            if form.is_match(&out) {
                out = form.replace_all(&out, REPLACEMENT).into_owned();
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

/// Whether `query` still contains a deprecated identifier-access call.
pub fn has_deprecated_id_access(query: &str) -> bool {
    deprecated_forms().iter().any(|form| form.is_match(query))
}
