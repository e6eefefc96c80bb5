//! References to other entities by identifier.
//!
//! The value is the referenced entity's own ID, so it doubles as the graph
//! node ID without any prefix.

use crate::text::sanitize_text;
use crate::types::{CleanContext, PropertyType};

pub struct EntityType;

impl PropertyType for EntityType {
    fn name(&self) -> &'static str {
        "entity"
    }
    fn label(&self) -> &'static str {
        "Entity"
    }
    fn max_length(&self) -> usize {
        255
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
        sanitize_text(raw)
    }
    fn node_id(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_the_value_itself() {
        assert_eq!(EntityType.node_id("acme-inc").as_deref(), Some("acme-inc"));
        assert_eq!(EntityType.node_id(""), None);
    }

    #[test]
    fn clean_only_sanitizes() {
        assert_eq!(
            EntityType.clean("  acme-inc \n", false, None, None),
            Some("acme-inc".into())
        );
        assert_eq!(EntityType.clean("   ", false, None, None), None);
    }
}
