//! Names and addresses: light normalization, edit-distance comparison.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{fingerprint, fingerprint_similarity, levenshtein, sanitize_text, slugify};
use crate::types::{CleanContext, PropertyType, within_length};

/// Quote characters stripped from the ends of names.
const NAME_QUOTES: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Personal and corporate names. Cleaning is deliberately conservative —
/// names keep their case and diacritics; only enclosing quotes and stray
/// whitespace go.
pub struct NameType;

impl PropertyType for NameType {
    fn name(&self) -> &'static str {
        "name"
    }
    fn group(&self) -> Option<&'static str> {
        Some("names")
    }
    fn label(&self) -> &'static str {
        "Name"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        512
    }
    fn validate(&self, value: &str) -> bool {
        !value.is_empty()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let trimmed = raw.trim_matches(NAME_QUOTES);
        sanitize_text(trimmed).filter(|v| within_length(self, v))
    }
    fn specificity(&self, value: &str) -> f64 {
        // Longer names are more distinctive, saturating at 50 characters.
        let n = value.chars().count() as f64;
        ((n - 3.0) / 47.0).clamp(0.0, 1.0)
    }
    fn compare(&self, left: &str, right: &str) -> f64 {
        fingerprint_similarity(left, right)
    }
}

static ADDR_BREAKS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\r\n|\n|<BR/>|<BR>|\t|ESQ\.,|ESQ,|;)").unwrap());
static ADDR_COMMATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(,\s?[,\.])").unwrap());

/// Pairs of addresses further apart than this (by fingerprint edit distance)
/// are not worth scoring — long addresses make edit distance expensive and
/// the similarity meaningless.
const ADDRESS_MAX_EDITS: usize = 6;

/// Postal addresses. Line breaks and stray separators become `, `; runs of
/// spaces collapse.
pub struct AddressType;

impl PropertyType for AddressType {
    fn name(&self) -> &'static str {
        "address"
    }
    fn group(&self) -> Option<&'static str> {
        Some("addresses")
    }
    fn label(&self) -> &'static str {
        "Address"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        512
    }
    fn validate(&self, value: &str) -> bool {
        !value.is_empty()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        // Break substitution runs before sanitization: sanitize collapses
        // newlines into plain spaces, which would hide them from the regex.
        let s = ADDR_BREAKS_RE.replace_all(raw, ", ");
        let s = sanitize_text(&s)?;
        let s = ADDR_COMMATA_RE.replace_all(&s, ", ");
        let mut s = s.trim().to_string();
        while s.contains("  ") {
            s = s.replace("  ", " ");
        }
        if s.is_empty() || !within_length(self, &s) {
            return None;
        }
        Some(s)
    }
    fn specificity(&self, value: &str) -> f64 {
        let n = value.chars().count() as f64;
        ((n - 3.0) / 47.0).clamp(0.0, 1.0)
    }
    fn compare(&self, left: &str, right: &str) -> f64 {
        let l = fingerprint(left);
        let r = fingerprint(right);
        if l.is_empty() || r.is_empty() {
            return 0.0;
        }
        if levenshtein(&l, &r) > ADDRESS_MAX_EDITS {
            return 0.0;
        }
        fingerprint_similarity(&l, &r)
    }
    fn node_id(&self, value: &str) -> Option<String> {
        slugify(value).map(|slug| format!("addr:{slug}"))
    }
}
