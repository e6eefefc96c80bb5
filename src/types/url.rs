//! URLs: scheme-tolerant parsing, host normalization, and a canonical form
//! for order-insensitive comparison.

use crate::text::sanitize_text;
use crate::types::domain::domain_to_ascii;
use crate::types::{CleanContext, PropertyType};

const ACCEPTED_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto"];

/// A URL decomposed into its logical parts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedUrl {
    scheme: String,
    /// Full mailto remainder; empty for hierarchical schemes.
    opaque: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl ParsedUrl {
    fn to_url(&self) -> String {
        if self.scheme == "mailto" {
            return format!("mailto:{}", self.opaque);
        }
        let mut out = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            out.push_str(&format!(":{port}"));
        }
        out.push_str(&self.path);
        if let Some(ref q) = self.query {
            out.push('?');
            out.push_str(q);
        }
        if let Some(ref f) = self.fragment {
            out.push('#');
            out.push_str(f);
        }
        out
    }

    /// Comparison form: fragment stripped, trailing slash normalized away,
    /// query parameters sorted by key then value.
    fn canonical(&self) -> String {
        if self.scheme == "mailto" {
            return format!("mailto:{}", self.opaque.to_lowercase());
        }
        let path = self.path.trim_end_matches('/');
        let query = self.query.as_deref().map(|q| {
            let mut params: Vec<&str> = q.split('&').filter(|p| !p.is_empty()).collect();
            params.sort_unstable();
            params.join("&")
        });
        let mut out = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            out.push_str(&format!(":{port}"));
        }
        out.push_str(path);
        if let Some(ref q) = query {
            if !q.is_empty() {
                out.push('?');
                out.push_str(q);
            }
        }
        out
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Parse a URL, inserting `http://` in front of bare `host/path` input.
fn parse_url(value: &str) -> Option<ParsedUrl> {
    let lower = value.to_lowercase();
    if let Some(rest) = lower.strip_prefix("mailto:") {
        if rest.is_empty() {
            return None;
        }
        return Some(ParsedUrl {
            scheme: "mailto".into(),
            opaque: value[7..].to_string(),
            host: String::new(),
            port: None,
            path: String::new(),
            query: None,
            fragment: None,
        });
    }
    let (scheme, rest) = match value.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => (scheme.to_lowercase(), rest),
        _ => ("http".to_string(), value),
    };
    if !ACCEPTED_SCHEMES.contains(&scheme.as_str()) {
        return None;
    }
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    if authority.is_empty() {
        return None;
    }
    let (host_raw, port) = match authority.rsplit_once(':') {
        Some((host, port_str)) if port_str.chars().all(|c| c.is_ascii_digit()) => {
            (host, Some(port_str.parse::<u16>().ok()?))
        }
        _ => (authority, None),
    };
    let host = domain_to_ascii(host_raw)?;
    let (path, query, fragment) = split_tail(tail);
    Some(ParsedUrl {
        scheme,
        opaque: String::new(),
        host,
        port,
        path,
        query,
        fragment,
    })
}

fn split_tail(tail: &str) -> (String, Option<String>, Option<String>) {
    let (before_frag, fragment) = match tail.split_once('#') {
        Some((b, f)) => (b, Some(f.to_string())),
        None => (tail, None),
    };
    let (path, query) = match before_frag.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (before_frag.to_string(), None),
    };
    (path, query, fragment)
}

/// Web addresses. Accepts http, https, ftp and mailto; bare `host/path`
/// input is treated as http.
pub struct UrlType;

impl UrlType {
    /// Expose the canonical comparison form, used by graph tooling.
    pub fn canonicalize(value: &str) -> Option<String> {
        parse_url(value).map(|u| u.canonical())
    }
}

impl PropertyType for UrlType {
    fn name(&self) -> &'static str {
        "url"
    }
    fn group(&self) -> Option<&'static str> {
        Some("urls")
    }
    fn label(&self) -> &'static str {
        "URL"
    }
    fn matchable(&self) -> bool {
        true
    }
    fn pivot(&self) -> bool {
        true
    }
    fn max_length(&self) -> usize {
        4096
    }
    fn validate(&self, value: &str) -> bool {
        parse_url(value).is_some()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let url = parse_url(&s)?.to_url();
        if url.len() > self.max_length() {
            return None;
        }
        Some(url)
    }
    fn specificity(&self, _value: &str) -> f64 {
        1.0
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(format!("url:{value}"))
    }
    fn compare(&self, left: &str, right: &str) -> f64 {
        match (parse_url(left), parse_url(right)) {
            (Some(l), Some(r)) if l.canonical() == r.canonical() => self.specificity(left),
            _ => 0.0,
        }
    }
    fn country_hint(&self, value: &str) -> Option<String> {
        let host = parse_url(value)?.host;
        let tld = host.rsplit('.').next()?;
        if tld.len() == 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(tld.to_lowercase())
        } else {
            None
        }
    }
}
