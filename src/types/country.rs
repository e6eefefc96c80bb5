//! Closed-vocabulary types: countries, languages, topics and genders.

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType};

/// ISO 3166-1 alpha-2 codes plus a handful of non-standard codes used for
/// historic and disputed territories.
const COUNTRY_CODES: &[&str] = &[
    "ae", "af", "al", "am", "ao", "ar", "at", "au", "az", "ba", "bd", "be", "bg", "bh", "bi",
    "bj", "bo", "br", "bs", "bw", "by", "bz", "ca", "cd", "cf", "cg", "ch", "ci", "cl", "cm",
    "cn", "co", "cr", "cu", "cz", "de", "dk", "do", "dz", "ec", "ee", "eg", "er", "es", "et",
    "fi", "fj", "fr", "ga", "gb", "ge", "gh", "gm", "gn", "gq", "gr", "gt", "gw", "gy", "hk",
    "hn", "hr", "ht", "hu", "id", "ie", "il", "in", "iq", "ir", "is", "it", "jm", "jo", "jp",
    "ke", "kg", "kh", "km", "kp", "kr", "kw", "kz", "la", "lb", "lk", "lr", "ls", "lt", "lu",
    "lv", "ly", "ma", "md", "me", "mg", "mk", "ml", "mm", "mn", "mr", "mt", "mu", "mw", "mx",
    "my", "mz", "na", "ne", "ng", "ni", "nl", "no", "np", "nz", "om", "pa", "pe", "pg", "ph",
    "pk", "pl", "ps", "pt", "py", "qa", "ro", "rs", "ru", "rw", "sa", "sd", "se", "sg", "si",
    "sk", "sl", "sn", "so", "ss", "sv", "sy", "sz", "td", "tg", "th", "tj", "tl", "tm", "tn",
    "tr", "tt", "tw", "tz", "ua", "ug", "us", "uy", "uz", "ve", "vn", "ye", "za", "zm", "zw",
];

/// ISO 639-3 codes for the languages that appear in source data.
const LANGUAGE_CODES: &[&str] = &[
    "afr", "ara", "aze", "bel", "ben", "bos", "bul", "cat", "ces", "cnr", "dan", "deu", "ell",
    "eng", "est", "fas", "fil", "fin", "fra", "heb", "hin", "hrv", "hun", "hye", "ind", "isl",
    "ita", "jpn", "kan", "kat", "kaz", "khm", "kir", "kor", "lav", "lit", "ltz", "mkd", "mlt",
    "mon", "msa", "mya", "nep", "nld", "nor", "pol", "por", "ron", "rus", "slk", "slv", "spa",
    "sqi", "srp", "swa", "swe", "tgk", "tgl", "tuk", "tur", "ukr", "urd", "uzb", "zho",
];

/// Risk- and role-related classifications attached to entities.
const TOPICS: &[&str] = &[
    "corp.offshore",
    "corp.public",
    "corp.shell",
    "crime",
    "crime.boss",
    "crime.fin",
    "crime.fraud",
    "crime.terror",
    "crime.theft",
    "crime.traffick",
    "crime.war",
    "debarment",
    "export.control",
    "export.risk",
    "gov.admin",
    "gov.executive",
    "gov.financial",
    "gov.head",
    "gov.igo",
    "gov.judicial",
    "gov.legislative",
    "gov.muni",
    "gov.national",
    "gov.security",
    "gov.soe",
    "gov.state",
    "mil",
    "poi",
    "pol.party",
    "pol.union",
    "reg.action",
    "reg.warn",
    "rel",
    "role.act",
    "role.civil",
    "role.diplo",
    "role.journo",
    "role.judge",
    "role.lawyer",
    "role.lobby",
    "role.oligarch",
    "role.pep",
    "role.rca",
    "role.spy",
    "sanction",
    "sanction.counter",
    "sanction.linked",
    "wanted",
];

fn normalize_code(raw: &str) -> Option<String> {
    let s = sanitize_text(raw)?;
    Some(s.trim().to_lowercase())
}

/// Country codes. Unknown two-letter codes validate (data sources invent
/// codes faster than lists get updated) but never clean.
pub struct CountryType;

impl PropertyType for CountryType {
    fn name(&self) -> &'static str {
        "country"
    }
    fn group(&self) -> Option<&'static str> {
        Some("countries")
    }
    fn label(&self) -> &'static str {
        "Country"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        16
    }
    fn validate(&self, value: &str) -> bool {
        let v = value.trim().to_lowercase();
        COUNTRY_CODES.binary_search(&v.as_str()).is_ok()
            || (value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()))
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let code = normalize_code(raw)?;
        COUNTRY_CODES
            .binary_search(&code.as_str())
            .is_ok()
            .then_some(code)
    }
    fn specificity(&self, _value: &str) -> f64 {
        // A shared country says very little about identity.
        0.1
    }
    fn country_hint(&self, value: &str) -> Option<String> {
        Some(value.to_lowercase())
    }
}

/// ISO 639-3 language codes against a fixed whitelist.
pub struct LanguageType;

impl PropertyType for LanguageType {
    fn name(&self) -> &'static str {
        "language"
    }
    fn group(&self) -> Option<&'static str> {
        Some("languages")
    }
    fn label(&self) -> &'static str {
        "Language"
    }
    fn max_length(&self) -> usize {
        16
    }
    fn validate(&self, value: &str) -> bool {
        let v = value.trim().to_lowercase();
        LANGUAGE_CODES.binary_search(&v.as_str()).is_ok()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let code = normalize_code(raw)?;
        LANGUAGE_CODES
            .binary_search(&code.as_str())
            .is_ok()
            .then_some(code)
    }
}

/// Entity classification topics, e.g. `role.pep` or `sanction`.
pub struct TopicType;

impl PropertyType for TopicType {
    fn name(&self) -> &'static str {
        "topic"
    }
    fn group(&self) -> Option<&'static str> {
        Some("topics")
    }
    fn label(&self) -> &'static str {
        "Topic"
    }
    fn max_length(&self) -> usize {
        64
    }
    fn validate(&self, value: &str) -> bool {
        TOPICS.binary_search(&value.trim().to_lowercase().as_str()).is_ok()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let code = normalize_code(raw)?;
        TOPICS.binary_search(&code.as_str()).is_ok().then_some(code)
    }
}

/// Gender enum, folding common abbreviations and translations.
pub struct GenderType;

impl PropertyType for GenderType {
    fn name(&self) -> &'static str {
        "gender"
    }
    fn group(&self) -> Option<&'static str> {
        Some("genders")
    }
    fn label(&self) -> &'static str {
        "Gender"
    }
    fn max_length(&self) -> usize {
        16
    }
    fn validate(&self, value: &str) -> bool {
        matches!(value, "male" | "female" | "other")
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let code = normalize_code(raw)?;
        let code = match code.as_str() {
            "m" | "man" | "masculin" | "männlich" | "мужской" => "male",
            "f" | "woman" | "féminin" | "weiblich" | "женский" => "female",
            "o" | "d" | "divers" => "other",
            other => other,
        };
        self.validate(code).then(|| code.to_string())
    }
}
