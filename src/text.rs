//! Shared text utilities: sanitization, hashing, edit distance.
//!
//! Every property type funnels raw input through [`sanitize_text`] before any
//! type-specific handling, so the rest of the crate can assume values are
//! NFC-normalized, free of control characters, and whitespace-collapsed.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Normalize raw text for storage: NFC normalization, control characters
/// stripped, runs of whitespace collapsed to a single space, trimmed.
///
/// Returns `None` for input that is empty after cleaning — the empty string
/// is never a valid value anywhere in the data model. Length is not bounded
/// here: oversized values must be rejected whole by the per-type caps, not
/// quietly shortened.
pub fn sanitize_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    let mut last_space = true; // leading whitespace is dropped
    for ch in text.nfc() {
        if ch == '\u{0}' || (ch.is_control() && !ch.is_whitespace()) {
            continue;
        }
        if ch.is_whitespace() {
            if last_space {
                continue;
            }
            out.push(' ');
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Derive a deterministic entity ID by hashing the given parts under an
/// optional key prefix. Returns `None` when no non-empty part contributed,
/// so callers never mint an ID out of nothing.
pub fn make_entity_id<I, S>(key_prefix: Option<&str>, parts: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    if let Some(prefix) = key_prefix {
        hasher.update(prefix.as_bytes());
    }
    let mut contributed = false;
    for part in parts {
        let part = part.as_ref();
        if !part.is_empty() {
            hasher.update(part.as_bytes());
            contributed = true;
        }
    }
    if !contributed {
        return None;
    }
    Some(hex::encode(hasher.finalize()))
}

/// Levenshtein edit distance over characters.
pub fn levenshtein(left: &str, right: &str) -> usize {
    let a: Vec<char> = left.chars().collect();
    let b: Vec<char> = right.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Lowercase and collapse every run of non-alphanumeric characters to a
/// single space. This is the shared normal form for fuzzy name and address
/// comparison.
pub fn fingerprint(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_sep = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push(' ');
            last_sep = true;
        }
    }
    out.trim_end().to_string()
}

/// Edit-distance similarity in `[0, 1]`: `1 - distance / max(len)`, clamped
/// at zero. Operates on [`fingerprint`] normal forms.
pub fn fingerprint_similarity(left: &str, right: &str) -> f64 {
    let l = fingerprint(left);
    let r = fingerprint(right);
    if l.is_empty() || r.is_empty() {
        return 0.0;
    }
    let dist = levenshtein(&l, &r);
    let max_len = l.chars().count().max(r.chars().count());
    (1.0 - dist as f64 / max_len as f64).max(0.0)
}

/// Reduce a value to a lowercase `[a-z0-9._-]` slug, or `None` when nothing
/// survives. Used for default graph node IDs.
pub fn slugify(value: &str) -> Option<String> {
    let sanitized = sanitize_text(&value.to_lowercase())?;
    let mut out = String::with_capacity(sanitized.len());
    for ch in sanitized.chars() {
        if ch == ' ' || ch == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '.' | '_') {
            out.push(ch);
        }
    }
    let out = out.trim_matches('-').to_string();
    if out.is_empty() { None } else { Some(out) }
}

/// Pick the shortest non-empty string, used by caption heuristics where the
/// tersest of several name spellings reads best.
pub fn shortest<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .min_by_key(|v| v.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("  John \t Smith \n"), Some("John Smith".into()));
    }

    #[test]
    fn sanitize_rejects_empty_and_control_only() {
        assert_eq!(sanitize_text(""), None);
        assert_eq!(sanitize_text("   "), None);
        assert_eq!(sanitize_text("\u{0}\u{1}\u{2}"), None);
    }

    #[test]
    fn sanitize_strips_embedded_controls() {
        assert_eq!(sanitize_text("a\u{0}b\u{7}c"), Some("abc".into()));
    }

    #[test]
    fn sanitize_keeps_long_values_whole() {
        // Oversized values are dropped by the per-type caps downstream;
        // sanitization must never shorten them.
        let long = "ü".repeat(20_000);
        let out = sanitize_text(&long).unwrap();
        assert_eq!(out.chars().count(), 20_000);
    }

    #[test]
    fn entity_id_is_deterministic_and_needs_parts() {
        let a = make_entity_id(Some("ds"), ["x", "y"]).unwrap();
        let b = make_entity_id(Some("ds"), ["x", "y"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, make_entity_id(Some("ds"), ["x", "z"]).unwrap());
        // a key prefix alone contributes nothing
        assert_eq!(make_entity_id(Some("ds"), Vec::<&str>::new()), None);
        assert_eq!(make_entity_id(Some("ds"), ["", ""]), None);
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn fingerprint_collapses_punctuation() {
        assert_eq!(fingerprint("Main St., Apt 2"), "main st apt 2");
        assert_eq!(fingerprint("  -- John  SMITH --"), "john smith");
    }

    #[test]
    fn similarity_of_identical_fingerprints_is_one() {
        assert_eq!(fingerprint_similarity("Main St., Apt 2", "Main St Apt 2"), 1.0);
    }

    #[test]
    fn slugify_produces_node_safe_ids() {
        assert_eq!(slugify("John Smith & Co."), Some("john-smith-co.".into()));
        assert_eq!(slugify("!!!"), None);
    }

    #[test]
    fn shortest_picks_tersest_value() {
        assert_eq!(
            shortest(["Vladimir Putin", "V. Putin", ""]),
            Some("V. Putin")
        );
        assert_eq!(shortest([]), None);
    }
}
