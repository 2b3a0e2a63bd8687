//! Recognized-text cleanup ahead of candidate generation.

use std::sync::LazyLock;

use regex::Regex;

static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Strip punctuation, keeping word characters, digits and whitespace.
///
/// Characters are removed rather than replaced, so `"2.5mg"` becomes
/// `"25mg"` and `"Ibuprofen-75"` becomes `"Ibuprofen75"`.
pub fn normalize_text(raw: &str) -> String {
    PUNCTUATION_RE.replace_all(raw, "").into_owned()
}
