//! Identifiers with per-format validation: IBAN checksum math, fixed-shape
//! registration codes, digit-count national IDs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType};

static IBAN_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}$").unwrap());
static LEI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{20}$").unwrap());
static BIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$").unwrap());
static ISIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{9}[0-9]$").unwrap());
static FIGI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{12}$").unwrap());
static UEI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{12}$").unwrap());
static USCC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Z]{18}$").unwrap());
static QID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Q[1-9]\d*$").unwrap());
static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").unwrap());
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\W_]+").unwrap());

/// Validate an IBAN and return its canonical (space-stripped, upper-cased)
/// form. The check is the standard rearrange-and-mod-97: move the country
/// code and check digits to the end, map letters to two-digit values, and
/// require a residue of 1. The modulus is folded into the running remainder
/// digit by digit, so the intermediate number never grows.
fn normalize_iban(value: &str) -> Option<String> {
    let compact: String = value.chars().filter(|c| *c != ' ').collect::<String>().to_uppercase();
    if !IBAN_SHAPE_RE.is_match(&compact) {
        return None;
    }
    let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
    let mut rem: u64 = 0;
    for ch in rearranged.chars() {
        match ch {
            '0'..='9' => {
                rem = (rem * 10 + (ch as u64 - '0' as u64)) % 97;
            }
            'A'..='Z' => {
                let val = ch as u64 - 'A' as u64 + 10;
                rem = (rem * 100 + val) % 97;
            }
            _ => return None,
        }
    }
    if rem == 1 { Some(compact) } else { None }
}

fn uppercase_compact(value: &str) -> String {
    value.replace(' ', "").to_uppercase()
}

fn digits_only(value: &str) -> String {
    NON_DIGIT_RE.replace_all(value, "").to_string()
}

/// Registration numbers, tax IDs, account numbers. The optional format hint
/// from the owning property selects a validation sub-mode; unknown or absent
/// formats pass the sanitized value through unchanged.
pub struct IdentifierType;

impl IdentifierType {
    fn clean_format(&self, value: &str, format: &str) -> Option<String> {
        match format {
            "iban" => normalize_iban(value),
            "lei" => Some(uppercase_compact(value)).filter(|v| LEI_RE.is_match(v)),
            "bic" => Some(uppercase_compact(value)).filter(|v| BIC_RE.is_match(v)),
            "isin" => Some(uppercase_compact(value)).filter(|v| ISIN_RE.is_match(v)),
            "figi" => Some(uppercase_compact(value)).filter(|v| FIGI_RE.is_match(v)),
            "uei" => Some(uppercase_compact(value)).filter(|v| UEI_RE.is_match(v)),
            "uscc" => Some(uppercase_compact(value)).filter(|v| USCC_RE.is_match(v)),
            "qid" => Some(value.trim().to_uppercase()).filter(|v| QID_RE.is_match(v)),
            "ssn" => Some(digits_only(value)).filter(|v| v.len() == 9),
            "inn" => Some(digits_only(value)).filter(|v| v.len() == 10 || v.len() == 12),
            "ogrn" => Some(digits_only(value)).filter(|v| v.len() == 13 || v.len() == 15),
            "npi" => Some(digits_only(value)).filter(|v| v.len() == 10),
            "imo" => Some(digits_only(value)).filter(|v| v.len() == 7),
            _ => Some(value.to_string()),
        }
    }
}

impl PropertyType for IdentifierType {
    fn name(&self) -> &'static str {
        "identifier"
    }
    fn group(&self) -> Option<&'static str> {
        Some("identifiers")
    }
    fn label(&self) -> &'static str {
        "Identifier"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        64
    }
    fn validate(&self, value: &str) -> bool {
        self.clean(value, false, None, None).is_some()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let format = format.unwrap_or("").to_lowercase();
        self.clean_format(&s, &format).filter(|v| v.len() <= self.max_length())
    }
    fn specificity(&self, value: &str) -> f64 {
        let n = value.chars().count() as f64;
        ((n - 4.0) / 6.0).clamp(0.0, 1.0)
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(format!("id:{value}"))
    }
    fn compare(&self, left: &str, right: &str) -> f64 {
        // Containment of one compacted identifier in the other counts
        // proportionally: "1234567" vs "DE-1234567" is a strong signal.
        let l = NON_WORD_RE.replace_all(left, "").to_lowercase();
        let r = NON_WORD_RE.replace_all(right, "").to_lowercase();
        if l.is_empty() || r.is_empty() {
            return 0.0;
        }
        if l == r {
            return 1.0;
        }
        if l.contains(&r) || r.contains(&l) {
            let (short, long) = if l.len() < r.len() { (&l, &r) } else { (&r, &l) };
            return short.len() as f64 / long.len() as f64;
        }
        0.0
    }
}
