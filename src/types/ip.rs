//! IP addresses, normalized through the standard library parser.

use std::net::IpAddr;

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType};

pub struct IpType;

impl PropertyType for IpType {
    fn name(&self) -> &'static str {
        "ip"
    }
    fn group(&self) -> Option<&'static str> {
        Some("ips")
    }
    fn label(&self) -> &'static str {
        "IP Address"
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
        value.parse::<IpAddr>().is_ok()
    }
    fn clean(
        &self,
        raw: &str,
        _fuzzy: bool,
        _format: Option<&str>,
        _context: Option<&dyn CleanContext>,
    ) -> Option<String> {
        let s = sanitize_text(raw)?;
        let addr: IpAddr = s.trim().parse().ok()?;
        Some(addr.to_string())
    }
    fn specificity(&self, _value: &str) -> f64 {
        1.0
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(format!("ip:{value}"))
    }
}
