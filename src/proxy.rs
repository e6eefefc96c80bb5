//! Entity instances bound to a schema.
//!
//! An [`EntityProxy`] holds the multi-valued properties of one entity and
//! enforces the schema's rules on every write: values are cleaned by the
//! property type, deduplicated, capped in aggregate size, and reverse
//! stubs are rejected.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::{ProxyError, Result};
use crate::model::property::Property;
use crate::model::schema::Schema;
use crate::model::Model;
use crate::text::{make_entity_id, shortest};
use crate::types::registry::registry;
use crate::types::{CleanContext, PropertyType};

#[derive(Debug, Clone)]
pub struct EntityProxy<'m> {
    model: &'m Model,
    schema: &'m Schema,
    pub id: String,
    /// Prepended to the hash input of [`EntityProxy::make_id`].
    pub key_prefix: Option<String>,
    /// Passthrough contextual fields, emitted by [`EntityProxy::to_dict`].
    pub context: BTreeMap<String, Value>,
    props: BTreeMap<String, Vec<String>>,
    /// Accumulated byte size of stored values, for total-size caps.
    size: usize,
}

impl<'m> EntityProxy<'m> {
    pub fn new(model: &'m Model, schema: &'m Schema, id: impl Into<String>) -> Self {
        EntityProxy {
            model,
            schema,
            id: id.into(),
            key_prefix: None,
            context: BTreeMap::new(),
            props: BTreeMap::new(),
            size: 0,
        }
    }

    pub fn schema(&self) -> &'m Schema {
        self.schema
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Derive and set a content-hashed ID from the given parts, scoped by
    /// the key prefix. Returns `None` when all parts are empty.
    pub fn make_id<I, S>(&mut self, parts: I) -> Option<&str>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = make_entity_id(self.key_prefix.as_deref(), parts)?;
        self.id = id;
        Some(&self.id)
    }

    fn property(&self, name: &str) -> Result<&'m Property> {
        self.schema.get(name).ok_or_else(|| {
            ProxyError::UnknownProperty {
                schema: self.schema.name.clone(),
                prop: name.to_string(),
            }
            .into()
        })
    }

    /// All values of a property. Unknown names yield an empty slice.
    pub fn get(&self, name: &str) -> &[String] {
        self.props.get(name).map_or(&[], Vec::as_slice)
    }

    /// The first value of a property, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Clean and add values to a property. Values the type rejects are
    /// dropped silently; unknown properties and stubs fail.
    pub fn add<I, S>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_with(name, values, false, None)
    }

    pub fn add_with<I, S>(
        &mut self,
        name: &str,
        values: I,
        fuzzy: bool,
        format: Option<&str>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prop = self.property(name)?;
        if prop.stub {
            return Err(ProxyError::StubWrite {
                qname: prop.qname.clone(),
            }
            .into());
        }
        let format = format.or(prop.format.as_deref());
        // Clean first with an immutable borrow, then store.
        let mut cleaned = Vec::new();
        for raw in values {
            if let Some(value) = prop.ptype.clean(raw.as_ref(), fuzzy, format, Some(self)) {
                cleaned.push(value);
            }
        }
        for value in cleaned {
            self.store(prop, value);
        }
        Ok(())
    }

    /// Replace all values of a property.
    pub fn set<I, S>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.props.remove(name);
        self.add(name, values)
    }

    /// Add one pre-resolved property value, returning the stored form.
    pub fn unsafe_add(&mut self, prop: &Property, raw: &str, fuzzy: bool) -> Option<String> {
        if prop.stub {
            return None;
        }
        let value = prop
            .ptype
            .clean(raw, fuzzy, prop.format.as_deref(), Some(self))?;
        self.store(prop, value.clone()).then_some(value)
    }

    fn store(&mut self, prop: &Property, value: String) -> bool {
        if value.len() > prop.effective_max_length() {
            return false;
        }
        if let Some(cap) = prop.ptype.total_size() {
            if self.size + value.len() > cap {
                return false;
            }
        }
        let slot = self.props.entry(prop.name.clone()).or_default();
        if slot.contains(&value) {
            return true;
        }
        self.size += value.len();
        slot.push(value);
        true
    }

    /// Remove and return all values of a property.
    pub fn pop(&mut self, name: &str) -> Vec<String> {
        self.props.remove(name).unwrap_or_default()
    }

    /// Remove a single value from a property.
    pub fn remove(&mut self, name: &str, value: &str) {
        if let Some(values) = self.props.get_mut(name) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.props.remove(name);
            }
        }
    }

    /// The properties that currently hold values, sorted by name.
    pub fn iter_props(&self) -> Vec<&'m Property> {
        self.props
            .keys()
            .filter_map(|name| self.schema.get(name))
            .collect()
    }

    /// Every (property, value) pair on the entity.
    pub fn iter_values(&self) -> Vec<(&'m Property, &str)> {
        let mut out = Vec::new();
        for (name, values) in &self.props {
            let Some(prop) = self.schema.get(name) else {
                continue;
            };
            for value in values {
                out.push((prop, value.as_str()));
            }
        }
        out
    }

    /// Distinct values across all properties of the given type.
    pub fn get_type_values(&self, ptype: &dyn PropertyType, matchable_only: bool) -> Vec<String> {
        let mut out = Vec::new();
        for (name, values) in &self.props {
            let Some(prop) = self.schema.get(name) else {
                continue;
            };
            if matchable_only && !prop.matchable {
                continue;
            }
            if prop.ptype.name() != ptype.name() {
                continue;
            }
            for value in values {
                if !out.contains(value) {
                    out.push(value.clone());
                }
            }
        }
        out
    }

    /// All (source, target) value pairs when the schema models an edge.
    pub fn edge_pairs(&self) -> Vec<(String, String)> {
        let Some(edge) = &self.schema.edge else {
            return Vec::new();
        };
        let sources = self.get(&edge.source);
        let targets = self.get(&edge.target);
        let mut out = Vec::with_capacity(sources.len() * targets.len());
        for s in sources {
            for t in targets {
                out.push((s.clone(), t.clone()));
            }
        }
        out
    }

    /// A display caption: the first caption property with a value, picking
    /// the shortest of several names. Falls back to the schema label.
    pub fn caption(&self) -> String {
        for name in &self.schema.caption {
            let Some(prop) = self.schema.get(name) else {
                continue;
            };
            let values = self.get(name);
            if prop.ptype.name() == "name" && values.len() > 1 {
                if let Some(best) = shortest(values.iter().map(String::as_str)) {
                    return best.to_string();
                }
            }
            if let Some(first) = values.first() {
                return first.clone();
            }
        }
        self.schema.label.clone()
    }

    /// Country codes found anywhere on the entity.
    pub fn countries(&self) -> Vec<String> {
        self.get_type_values(registry().get_or_string("country"), false)
    }

    /// Plain JSON form: id, schema, properties, plus context fields.
    pub fn to_dict(&self) -> Value {
        let mut data = json!({
            "id": self.id,
            "schema": self.schema.name,
            "properties": self.props,
        });
        if let Value::Object(map) = &mut data {
            for (k, v) in &self.context {
                map.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        data
    }

    /// Merge another entity into this one, widening to the most specific
    /// common schema. Values are re-cleaned fuzzily on the way in.
    pub fn merge(&mut self, other: &EntityProxy<'m>) -> Result<()> {
        if self.id.is_empty() {
            self.id = other.id.clone();
        }
        self.schema = self.model.common_schema(self.schema, other.schema)?;
        for (k, v) in &other.context {
            self.context.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (name, values) in &other.props {
            self.add_with(name, values, true, None)?;
        }
        Ok(())
    }
}

impl CleanContext for EntityProxy<'_> {
    fn countries(&self) -> Vec<String> {
        EntityProxy::countries(self)
    }
}
