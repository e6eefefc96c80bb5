//! Resolved schema properties.

use std::fmt;

use crate::model::spec::PropertySpec;
use crate::types::registry::registry;
use crate::types::PropertyType;

/// A single field of a schema, carrying its property type and, for
/// entity-typed properties, the range schema and reverse link.
///
/// Reverse stubs are synthesized for the inbound side of entity links;
/// they can be read but never written.
#[derive(Clone)]
pub struct Property {
    pub name: String,
    /// `Schema:prop`, scoped to the schema that declared the property.
    pub qname: String,
    pub label: String,
    pub description: String,
    pub hidden: bool,
    pub matchable: bool,
    pub deprecated: bool,
    pub max_length: Option<usize>,
    pub ptype: &'static dyn PropertyType,
    /// Name of the schema an entity-typed property points at.
    pub range: Option<String>,
    /// Default cleaning format, e.g. `"iban"` on identifier properties.
    pub format: Option<String>,
    /// True for synthesized inbound stubs.
    pub stub: bool,
    /// Name of the reverse property on the range schema, if any.
    pub reverse: Option<String>,
}

impl Property {
    pub(crate) fn from_spec(schema_name: &str, name: &str, spec: &PropertySpec) -> Property {
        let type_name = if spec.type_name.is_empty() {
            "string"
        } else {
            &spec.type_name
        };
        let ptype = registry().get_or_string(type_name);
        let label = if spec.label.is_empty() {
            name.to_string()
        } else {
            spec.label.clone()
        };
        Property {
            name: name.to_string(),
            qname: format!("{schema_name}:{name}"),
            label,
            description: spec.description.clone(),
            hidden: spec.hidden.unwrap_or(false),
            matchable: spec.matchable.unwrap_or_else(|| ptype.matchable()),
            deprecated: spec.deprecated.unwrap_or(false),
            max_length: spec.max_length,
            ptype,
            range: (!spec.range.is_empty()).then(|| spec.range.clone()),
            format: (!spec.format.is_empty()).then(|| spec.format.clone()),
            stub: false,
            reverse: None,
        }
    }

    /// Whether values of this property reference other entities.
    pub fn is_entity(&self) -> bool {
        self.ptype.name() == "entity"
    }

    /// Effective length cap, the property override winning over the type.
    pub fn effective_max_length(&self) -> usize {
        self.max_length.unwrap_or_else(|| self.ptype.max_length())
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("qname", &self.qname)
            .field("type", &self.ptype.name())
            .field("range", &self.range)
            .field("stub", &self.stub)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_the_type() {
        let spec = PropertySpec {
            type_name: "email".into(),
            ..Default::default()
        };
        let prop = Property::from_spec("Person", "email", &spec);
        assert_eq!(prop.qname, "Person:email");
        assert_eq!(prop.label, "email");
        assert!(prop.matchable, "email type is matchable by default");
        assert_eq!(prop.effective_max_length(), 254);
    }

    #[test]
    fn explicit_flags_override_the_type() {
        let spec = PropertySpec {
            type_name: "email".into(),
            matchable: Some(false),
            max_length: Some(100),
            ..Default::default()
        };
        let prop = Property::from_spec("Person", "email", &spec);
        assert!(!prop.matchable);
        assert_eq!(prop.effective_max_length(), 100);
    }

    #[test]
    fn unknown_types_fall_back_to_string() {
        let spec = PropertySpec {
            type_name: "hologram".into(),
            ..Default::default()
        };
        let prop = Property::from_spec("Thing", "p", &spec);
        assert_eq!(prop.ptype.name(), "string");
    }
}
