//! Internationalized domain handling: punycode (RFC 3492) encoding and
//! hostname label checks, shared by the email and URL types.

use once_cell::sync::Lazy;
use regex::Regex;

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").unwrap());

fn encode_digit(d: u32) -> char {
    match d {
        0..=25 => (b'a' + d as u8) as char,
        26..=35 => (b'0' + (d - 26) as u8) as char,
        _ => unreachable!("punycode digit out of range"),
    }
}

fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta /= if first_time { DAMP } else { 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + ((BASE - TMIN + 1) * delta) / (delta + SKEW)
}

/// Punycode-encode a single label (RFC 3492 §6.3). Returns `None` on
/// overflow, which cannot happen for inputs within hostname length limits.
fn punycode_encode(input: &str) -> Option<String> {
    let code_points: Vec<u32> = input.chars().map(|c| c as u32).collect();
    let mut output: String = input.chars().filter(|c| c.is_ascii()).collect();
    let basic = output.chars().count() as u32;
    if basic > 0 {
        output.push('-');
    }
    let mut handled = basic;
    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let total = code_points.len() as u32;
    while handled < total {
        let m = code_points.iter().copied().filter(|&c| c >= n).min()?;
        delta = delta.checked_add((m - n).checked_mul(handled + 1)?)?;
        n = m;
        for &c in &code_points {
            if c < n {
                delta = delta.checked_add(1)?;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = if k <= bias {
                        TMIN
                    } else if k >= bias + TMAX {
                        TMAX
                    } else {
                        k - bias
                    };
                    if q < t {
                        break;
                    }
                    output.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == basic);
                delta = 0;
                handled += 1;
            }
        }
        delta = delta.checked_add(1)?;
        n += 1;
    }
    Some(output)
}

/// Convert a hostname to its ASCII-compatible encoding: lowercase, each
/// non-ASCII label punycode-encoded under the `xn--` prefix. Every resulting
/// label must have a valid hostname shape. A trailing dot is dropped.
///
/// Returns `None` for domains that do not survive encoding — the caller
/// treats that as a rejected value, never an error.
pub fn domain_to_ascii(domain: &str) -> Option<String> {
    let domain = domain.trim_end_matches('.').to_lowercase();
    if domain.is_empty() {
        return None;
    }
    let mut labels = Vec::new();
    for label in domain.split('.') {
        if label.is_empty() {
            return None;
        }
        let ascii = if label.is_ascii() {
            label.to_string()
        } else {
            format!("xn--{}", punycode_encode(label)?)
        };
        if !LABEL_RE.is_match(&ascii) {
            return None;
        }
        labels.push(ascii);
    }
    Some(labels.join("."))
}

/// Like [`domain_to_ascii`], but additionally requires at least two labels —
/// the shape expected of a public mail or web host.
pub fn qualified_domain_to_ascii(domain: &str) -> Option<String> {
    let ascii = domain_to_ascii(domain)?;
    if ascii.split('.').count() < 2 {
        return None;
    }
    Some(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punycode_encodes_reference_label() {
        assert_eq!(punycode_encode("bücher").as_deref(), Some("bcher-kva"));
        assert_eq!(punycode_encode("münchen").as_deref(), Some("mnchen-3ya"));
    }

    #[test]
    fn ascii_domains_pass_through_lowercased() {
        assert_eq!(domain_to_ascii("Example.COM").as_deref(), Some("example.com"));
        assert_eq!(domain_to_ascii("example.com.").as_deref(), Some("example.com"));
    }

    #[test]
    fn idn_domains_are_encoded() {
        assert_eq!(
            domain_to_ascii("bücher.de").as_deref(),
            Some("xn--bcher-kva.de")
        );
    }

    #[test]
    fn bad_label_shapes_are_rejected() {
        assert_eq!(domain_to_ascii("-leading.com"), None);
        assert_eq!(domain_to_ascii("trailing-.com"), None);
        assert_eq!(domain_to_ascii("a..b"), None);
        assert_eq!(domain_to_ascii(""), None);
    }

    #[test]
    fn qualified_requires_two_labels() {
        assert_eq!(qualified_domain_to_ascii("localhost"), None);
        assert_eq!(
            qualified_domain_to_ascii("mail.example.org").as_deref(),
            Some("mail.example.org")
        );
    }
}
