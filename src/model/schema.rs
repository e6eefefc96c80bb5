//! Resolved entity schemata.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EntigraphError, ProxyError};
use crate::model::property::Property;
use crate::model::spec::SchemaSpec;

/// Graph-edge semantics of a schema, when it models a relationship
/// rather than a node.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub caption: Vec<String>,
    pub label: String,
    pub directed: bool,
}

/// An entity class with its full, inheritance-resolved property set.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub label: String,
    pub plural: String,
    pub description: String,

    pub abstract_: bool,
    pub hidden: bool,
    pub generated: bool,
    pub matchable: bool,
    pub deprecated: bool,

    pub featured: Vec<String>,
    pub required: Vec<String>,
    pub caption: Vec<String>,

    pub edge: Option<Edge>,

    /// Direct parent names.
    pub extends: Vec<String>,
    /// Self plus all ancestor names.
    pub names: BTreeSet<String>,
    /// All schemata that inherit from this one.
    pub descendants: BTreeSet<String>,

    /// Own and inherited properties, including reverse stubs.
    pub properties: BTreeMap<String, Property>,

    pub(crate) temporal_start: Vec<String>,
    pub(crate) temporal_end: Vec<String>,
}

impl Schema {
    pub(crate) fn from_spec(name: &str, spec: &SchemaSpec) -> Schema {
        let label = if spec.label.is_empty() {
            name.to_string()
        } else {
            spec.label.clone()
        };
        let plural = if spec.plural.is_empty() {
            label.clone()
        } else {
            spec.plural.clone()
        };
        let edge = (!spec.edge.is_empty()).then(|| Edge {
            source: spec.edge.source.clone(),
            target: spec.edge.target.clone(),
            caption: spec.edge.caption.clone(),
            label: spec.edge.label.clone(),
            directed: spec.edge.directed.unwrap_or(true),
        });
        let mut properties = BTreeMap::new();
        for (pname, pspec) in &spec.properties {
            properties.insert(pname.clone(), Property::from_spec(name, pname, pspec));
        }
        let mut names = BTreeSet::new();
        names.insert(name.to_string());
        Schema {
            name: name.to_string(),
            label,
            plural,
            description: spec.description.clone(),
            abstract_: spec.abstract_.unwrap_or(false),
            hidden: spec.hidden.unwrap_or(false),
            generated: spec.generated.unwrap_or(false),
            matchable: spec.matchable.unwrap_or(false),
            deprecated: spec.deprecated.unwrap_or(false),
            featured: spec.featured.clone(),
            required: spec.required.clone(),
            caption: spec.caption.clone(),
            edge,
            extends: spec.extends.clone(),
            names,
            descendants: BTreeSet::new(),
            properties,
            temporal_start: spec.temporal.start.clone(),
            temporal_end: spec.temporal.end.clone(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Whether this schema is, or inherits from, `candidate`.
    pub fn is_a(&self, candidate: &str) -> bool {
        self.names.contains(candidate)
    }

    /// Whether the schema models a relationship between two entities.
    pub fn is_edge(&self) -> bool {
        self.edge.is_some()
    }

    /// Properties in display order: caption fields first, then featured
    /// fields, then the rest ordered by label.
    pub fn sorted_properties(&self) -> Vec<&Property> {
        let rank = |prop: &Property| {
            let caption = self
                .caption
                .iter()
                .position(|n| n == &prop.name)
                .unwrap_or(usize::MAX);
            let featured = self
                .featured
                .iter()
                .position(|n| n == &prop.name)
                .unwrap_or(usize::MAX);
            (caption, featured)
        };
        let mut props: Vec<&Property> = self.properties.values().collect();
        props.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.label.cmp(&b.label)));
        props
    }

    /// Properties marking the start of the schema's temporal extent.
    pub fn temporal_start_props(&self) -> Vec<&Property> {
        self.temporal_start
            .iter()
            .filter_map(|n| self.get(n))
            .collect()
    }

    /// Properties marking the end of the schema's temporal extent.
    pub fn temporal_end_props(&self) -> Vec<&Property> {
        self.temporal_end
            .iter()
            .filter_map(|n| self.get(n))
            .collect()
    }

    /// Check required fields and per-type value validity.
    pub fn validate(&self, data: &BTreeMap<String, Vec<String>>) -> crate::error::Result<()> {
        for req in &self.required {
            if data.get(req).map_or(true, |v| v.is_empty()) {
                return Err(EntigraphError::Proxy(ProxyError::RequiredMissing {
                    prop: req.clone(),
                }));
            }
        }
        for (name, values) in data {
            let Some(prop) = self.properties.get(name) else {
                continue;
            };
            for value in values {
                if !prop.ptype.validate(value) {
                    return Err(EntigraphError::Proxy(ProxyError::InvalidValue {
                        prop: prop.qname.clone(),
                        value: value.clone(),
                    }));
                }
            }
        }
        Ok(())
    }
}
