//! Telephone numbers, normalized to E.164 where possible.
//!
//! Numbers carrying an international prefix are parsed directly; national
//! numbers are retried against the country hints supplied by the cleaning
//! context until one produces a plausible result.

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType};

/// ISO 3166-1 alpha-2 region to ITU calling code. Covers the regions that
/// show up in practice; unknown regions simply fail the retry.
const CALLING_CODES: &[(&str, &str)] = &[
    ("ad", "376"),
    ("ae", "971"),
    ("ar", "54"),
    ("at", "43"),
    ("au", "61"),
    ("az", "994"),
    ("ba", "387"),
    ("bd", "880"),
    ("be", "32"),
    ("bg", "359"),
    ("br", "55"),
    ("by", "375"),
    ("ca", "1"),
    ("ch", "41"),
    ("cn", "86"),
    ("co", "57"),
    ("cy", "357"),
    ("cz", "420"),
    ("de", "49"),
    ("dk", "45"),
    ("ee", "372"),
    ("eg", "20"),
    ("es", "34"),
    ("fi", "358"),
    ("fr", "33"),
    ("gb", "44"),
    ("ge", "995"),
    ("gr", "30"),
    ("hk", "852"),
    ("hr", "385"),
    ("hu", "36"),
    ("id", "62"),
    ("ie", "353"),
    ("il", "972"),
    ("in", "91"),
    ("iq", "964"),
    ("ir", "98"),
    ("is", "354"),
    ("it", "39"),
    ("jp", "81"),
    ("ke", "254"),
    ("kg", "996"),
    ("kr", "82"),
    ("kz", "7"),
    ("lt", "370"),
    ("lu", "352"),
    ("lv", "371"),
    ("md", "373"),
    ("me", "382"),
    ("mk", "389"),
    ("mt", "356"),
    ("mx", "52"),
    ("my", "60"),
    ("ng", "234"),
    ("nl", "31"),
    ("no", "47"),
    ("nz", "64"),
    ("pa", "507"),
    ("ph", "63"),
    ("pk", "92"),
    ("pl", "48"),
    ("pt", "351"),
    ("ro", "40"),
    ("rs", "381"),
    ("ru", "7"),
    ("sa", "966"),
    ("se", "46"),
    ("sg", "65"),
    ("si", "386"),
    ("sk", "421"),
    ("th", "66"),
    ("tr", "90"),
    ("ua", "380"),
    ("us", "1"),
    ("uz", "998"),
    ("ve", "58"),
    ("vn", "84"),
    ("za", "27"),
];

fn calling_code(region: &str) -> Option<&'static str> {
    let region = region.to_lowercase();
    CALLING_CODES
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, code)| *code)
}

fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn plausible(e164: &str) -> bool {
    let digits = e164.strip_prefix('+').unwrap_or(e164);
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Interpret `value` as an international number. `00` is accepted as an
/// alias for the `+` prefix.
fn parse_international(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let rest = if let Some(rest) = trimmed.strip_prefix('+') {
        rest
    } else if trimmed.starts_with("00") {
        &trimmed[2..]
    } else {
        return None;
    };
    let digits = digits_of(rest);
    let candidate = format!("+{digits}");
    plausible(&candidate).then_some(candidate)
}

/// Interpret `value` as a national number in `region`, stripping a trunk
/// zero before prefixing the calling code.
fn parse_national(value: &str, region: &str) -> Option<String> {
    let code = calling_code(region)?;
    let digits = digits_of(value);
    let national = digits.strip_prefix('0').unwrap_or(&digits);
    if national.is_empty() {
        return None;
    }
    let candidate = format!("+{code}{national}");
    plausible(&candidate).then_some(candidate)
}

pub struct PhoneType;

impl PropertyType for PhoneType {
    fn name(&self) -> &'static str {
        "phone"
    }
    fn group(&self) -> Option<&'static str> {
        Some("phones")
    }
    fn label(&self) -> &'static str {
        "Phone number"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        32
    }
    fn validate(&self, value: &str) -> bool {
        value.starts_with('+') && plausible(value)
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        format: Option<&str>,
        context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        if let Some(number) = parse_international(&s) {
            return Some(number);
        }
        if let Some(region) = format {
            if let Some(number) = parse_national(&s, region) {
                return Some(number);
            }
        }
        if let Some(ctx) = context {
            for region in ctx.countries() {
                if let Some(number) = parse_national(&s, &region) {
                    return Some(number);
                }
            }
        }
        None
    }
    fn specificity(&self, _value: &str) -> f64 {
        1.0
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(format!("tel:{value}"))
    }
    fn country_hint(&self, value: &str) -> Option<String> {
        let digits = value.strip_prefix('+')?;
        // Longest-prefix match so "+1..." does not shadow "+123...".
        let mut best: Option<(&str, &str)> = None;
        for (region, code) in CALLING_CODES {
            if digits.starts_with(code) {
                match best {
                    Some((_, held)) if held.len() >= code.len() => {}
                    _ => best = Some((region, code)),
                }
            }
        }
        best.map(|(region, _)| region.to_string())
    }
}
