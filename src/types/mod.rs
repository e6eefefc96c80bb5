//! The property type registry: pluggable value kinds.
//!
//! Every value held by an entity belongs to exactly one [`PropertyType`],
//! which owns validation, cleaning/normalization, specificity scoring and
//! (for matchable types) fuzzy comparison. Types are stateless and shared;
//! the [`registry`](crate::types::registry) module catalogs them by name.

pub mod country;
pub mod domain;
pub mod email;
pub mod entity;
pub mod identifier;
pub mod ip;
pub mod name;
pub mod phone;
pub mod registry;
pub mod string;
pub mod url;

use crate::text;

/// Cross-property context made available to [`PropertyType::clean`].
///
/// Cleaning a value sometimes benefits from other values already present on
/// the entity being written — the canonical case is inferring a phone
/// number's region from the entity's country codes. `EntityProxy` implements
/// this; standalone cleaning can pass `None`.
pub trait CleanContext {
    /// Country codes (ISO 3166-1 alpha-2, lowercase) already held by the entity.
    fn countries(&self) -> Vec<String>;
}

/// Behavior of a single value kind.
///
/// Implementations are stateless: all configuration is baked into the
/// implementing struct, and every method takes the value by reference.
pub trait PropertyType: Send + Sync {
    /// Unique type name, as referenced from schema specifications.
    fn name(&self) -> &'static str;

    /// Logical group name shared by all values of this kind across an entity.
    fn group(&self) -> Option<&'static str> {
        None
    }

    /// Human-readable label.
    fn label(&self) -> &'static str;

    /// Whether values of this type take part in cross-entity comparison.
    fn matchable(&self) -> bool {
        false
    }

    /// Whether values of this type form pivot nodes in graph projection.
    fn pivot(&self) -> bool {
        false
    }

    /// Maximum length of a single value, in bytes.
    fn max_length(&self) -> usize;

    /// Cap on the total accumulated size of all values of this type on one
    /// entity. `None` means unlimited.
    fn total_size(&self) -> Option<usize> {
        None
    }

    /// Check whether an already-cleaned value is acceptable.
    fn validate(&self, value: &str) -> bool;

    /// Normalize a raw value. Returns `None` for input this type does not
    /// accept — malformed input is never an error, and the empty string is
    /// never a valid cleaned value.
    fn clean(
        &self,
        raw: &str,
        fuzzy: bool,
        format: Option<&str>,
        context: Option<&dyn CleanContext>,
    ) -> Option<String>;

    /// How distinctive a value is, in `[0, 1]`. Used as a graph edge weight.
    fn specificity(&self, _value: &str) -> f64 {
        0.0
    }

    /// Human-friendly rendering of a cleaned value.
    fn caption(&self, value: &str, _format: Option<&str>) -> String {
        value.to_string()
    }

    /// Stable graph-node key for a value, or `None` when the value cannot
    /// anchor a node. The default slugs the value under the type name.
    fn node_id(&self, value: &str) -> Option<String> {
        text::slugify(value).map(|slug| format!("{}:{}", self.name(), slug))
    }

    /// Best-effort geographic inference from a value (ISO alpha-2, lowercase).
    fn country_hint(&self, _value: &str) -> Option<String> {
        None
    }

    /// Fuzzy similarity of two cleaned values in `[0, 1]`. The default is
    /// exact equality.
    fn compare(&self, left: &str, right: &str) -> f64 {
        if left == right { 1.0 } else { 0.0 }
    }
}

/// Enforce the per-value length bound shared by all `clean` implementations.
pub(crate) fn within_length(ty: &dyn PropertyType, value: &str) -> bool {
    value.len() <= ty.max_length()
}

#[cfg(test)]
mod tests {
    use super::registry::registry;
    use super::*;

    #[test]
    fn default_node_id_slugs_under_type_name() {
        let name = registry().get("name").unwrap();
        assert_eq!(
            name.node_id("John  Smith").as_deref(),
            Some("name:john-smith")
        );
        assert_eq!(name.node_id("!!!"), None);
    }

    #[test]
    fn default_compare_is_exact_equality() {
        let country = registry().get("country").unwrap();
        assert_eq!(country.compare("de", "de"), 1.0);
        assert_eq!(country.compare("de", "fr"), 0.0);
    }
}
