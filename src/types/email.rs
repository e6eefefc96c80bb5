//! E-mail addresses with internationalized domain handling.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::sanitize_text;
use crate::types::domain::qualified_domain_to_ascii;
use crate::types::{CleanContext, PropertyType};

static LOCAL_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^<>()\[\]\\,;:\?\s@"]{1,64}$"#).unwrap());

/// E-mail addresses. Cleaning strips `mailto:` prefixes and display-name
/// wrappers (`Jane <jane@example.org>`), validates the local part, converts
/// the domain to its ASCII-compatible encoding and lowercases the result.
pub struct EmailType;

impl PropertyType for EmailType {
    fn name(&self) -> &'static str {
        "email"
    }
    fn group(&self) -> Option<&'static str> {
        Some("emails")
    }
    fn label(&self) -> &'static str {
        "E-Mail address"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        254
    }
    fn validate(&self, value: &str) -> bool {
        self.clean(value, false, None, None).is_some()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let mut s = s.strip_prefix("mailto:").unwrap_or(&s).trim().to_string();
        // Unwrap a display-name envelope: everything after the last '<',
        // with a trailing '>' removed.
        if let Some(idx) = s.rfind('<') {
            s = s[idx + 1..].trim_end_matches('>').trim().to_string();
        }
        let at = s.rfind('@')?;
        if at == 0 || at == s.len() - 1 {
            return None;
        }
        let (local, domain) = (&s[..at], &s[at + 1..]);
        if !LOCAL_PART_RE.is_match(local) {
            return None;
        }
        let ascii_domain = qualified_domain_to_ascii(domain)?;
        let email = format!("{}@{}", local, ascii_domain).to_lowercase();
        if email.len() > self.max_length() {
            return None;
        }
        Some(email)
    }
    fn specificity(&self, _value: &str) -> f64 {
        1.0
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(format!("email:{}", value.to_lowercase()))
    }
    fn country_hint(&self, value: &str) -> Option<String> {
        // A two-letter country TLD is a weak but usable hint.
        let tld = value.rsplit('.').next()?;
        if tld.len() == 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(tld.to_lowercase())
        } else {
            None
        }
    }
}
