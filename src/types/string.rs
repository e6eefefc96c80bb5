//! Plain-text value kinds: string, text, html, json, mimetype, checksum,
//! number and date. These share the sanitize-and-check shape; the
//! interesting per-type behavior is in validation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType, within_length};

/// Catch-all for short free text.
pub struct StringType;

impl PropertyType for StringType {
    fn name(&self) -> &'static str {
        "string"
    }
    fn label(&self) -> &'static str {
        "String"
    }
    fn max_length(&self) -> usize {
        1024
    }
    fn validate(&self, value: &str) -> bool {
        sanitize_text(value).is_some()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        sanitize_text(raw).filter(|v| within_length(self, v))
    }
}

/// Long-form text. Not matchable; capped in aggregate so one entity cannot
/// accumulate unbounded document bodies.
pub struct TextType;

impl PropertyType for TextType {
    fn name(&self) -> &'static str {
        "text"
    }
    fn label(&self) -> &'static str {
        "Text"
    }
    fn max_length(&self) -> usize {
        65_000
    }
    fn total_size(&self) -> Option<usize> {
        Some(30 * 1024 * 1024)
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
        sanitize_text(raw).filter(|v| within_length(self, v))
    }
}

/// Markup content. Mirrors [`TextType`] but signals HTML to consumers.
pub struct HtmlType;

impl PropertyType for HtmlType {
    fn name(&self) -> &'static str {
        "html"
    }
    fn label(&self) -> &'static str {
        "HTML"
    }
    fn max_length(&self) -> usize {
        65_000
    }
    fn total_size(&self) -> Option<usize> {
        Some(30 * 1024 * 1024)
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
        sanitize_text(raw).filter(|v| within_length(self, v))
    }
}

/// Nested data packed as a JSON string. Raw non-JSON input is stored as a
/// JSON string literal so the value always parses on the way out.
pub struct JsonType;

impl PropertyType for JsonType {
    fn name(&self) -> &'static str {
        "json"
    }
    fn label(&self) -> &'static str {
        "Nested data"
    }
    fn max_length(&self) -> usize {
        65_000
    }
    fn validate(&self, value: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(value).is_ok()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let packed = if serde_json::from_str::<serde_json::Value>(&s).is_ok() {
            s
        } else {
            serde_json::to_string(&s).ok()?
        };
        Some(packed).filter(|v| within_length(self, v))
    }
    fn node_id(&self, _value: &str) -> Option<String> {
        None
    }
}

static MIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9!#$&^_.+-]{1,127}/[a-zA-Z0-9!#$&^_.+-]{1,127}$").unwrap()
});

/// `type/subtype` media type tokens. The generic fallback
/// `application/octet-stream` carries no information and is rejected.
pub struct MimeTypeType;

impl PropertyType for MimeTypeType {
    fn name(&self) -> &'static str {
        "mimetype"
    }
    fn group(&self) -> Option<&'static str> {
        Some("mimetypes")
    }
    fn label(&self) -> &'static str {
        "MIME type"
    }
    fn max_length(&self) -> usize {
        255
    }
    fn validate(&self, value: &str) -> bool {
        MIME_RE.is_match(value)
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?.to_lowercase();
        if s == "application/octet-stream" || !MIME_RE.is_match(&s) {
            return None;
        }
        Some(s)
    }
}

static CHECKSUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// Hex content digests (40-character hex, the shape used for document
/// content addressing).
pub struct ChecksumType;

impl PropertyType for ChecksumType {
    fn name(&self) -> &'static str {
        "checksum"
    }
    fn group(&self) -> Option<&'static str> {
        Some("checksums")
    }
    fn label(&self) -> &'static str {
        "Checksum"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        40
    }
    fn validate(&self, value: &str) -> bool {
        CHECKSUM_RE.is_match(&value.to_lowercase())
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?.to_lowercase();
        if CHECKSUM_RE.is_match(&s) { Some(s) } else { None }
    }
    fn specificity(&self, _value: &str) -> f64 {
        1.0
    }
}

/// Numeric values kept as strings, with thousands separators stripped.
pub struct NumberType;

impl PropertyType for NumberType {
    fn name(&self) -> &'static str {
        "number"
    }
    fn label(&self) -> &'static str {
        "Number"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        250
    }
    fn validate(&self, value: &str) -> bool {
        value.parse::<f64>().is_ok_and(|f| f.is_finite())
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?.replace(',', "");
        if self.validate(&s) { Some(s) } else { None }
    }
}

static DATE_FULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static DATE_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").unwrap());
static DATE_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static DATE_JUNK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9-]").unwrap());

/// Dates at year, month or day precision: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`.
pub struct DateType;

impl PropertyType for DateType {
    fn name(&self) -> &'static str {
        "date"
    }
    fn label(&self) -> &'static str {
        "Date"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        32
    }
    fn validate(&self, value: &str) -> bool {
        DATE_FULL_RE.is_match(value)
            || DATE_MONTH_RE.is_match(value)
            || DATE_YEAR_RE.is_match(value)
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let s = DATE_JUNK_RE.replace_all(&s, "").to_string();
        if self.validate(&s) { Some(s) } else { None }
    }
}
