//! Statements: atomic (entity, property, value) facts with provenance.
//!
//! Every statement carries a content-derived ID so repeated ingestion of
//! the same fact is idempotent. The base-identity statement (`prop = "id"`)
//! anchors an entity's existence even when it has no other values.

pub mod entity;
pub mod io;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ProxyError, Result};
use crate::model::Model;
use crate::proxy::EntityProxy;

/// Property name of the base-identity statement.
pub const BASE_ID: &str = "id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statement {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub canonical_id: String,
    pub prop: String,
    /// Name of the property's type; backfilled on read when absent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prop_type: String,
    pub schema: String,
    pub value: String,
    pub dataset: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lang: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_value: String,
    #[serde(default)]
    pub external: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_seen: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_seen: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin: String,
}

/// Hash the identifying fields of a statement into its ID. Empty when
/// the property or value is missing.
pub fn make_statement_key(
    dataset: &str,
    entity_id: &str,
    prop: &str,
    value: &str,
    external: bool,
) -> Option<String> {
    if prop.is_empty() || value.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(dataset.as_bytes());
    hasher.update(b".");
    hasher.update(entity_id.as_bytes());
    hasher.update(b".");
    hasher.update(prop.as_bytes());
    hasher.update(b".");
    hasher.update(value.as_bytes());
    if external {
        hasher.update(b".ext");
    }
    Some(hex::encode(hasher.finalize()))
}

/// Resolve the type name for a (schema, prop) pair; the base-identity
/// property maps to itself.
pub fn prop_type_name(model: &Model, schema: &str, prop: &str) -> Result<String> {
    if prop == BASE_ID {
        return Ok(BASE_ID.to_string());
    }
    let sc = model.schema(schema)?;
    let pr = sc.get(prop).ok_or_else(|| ProxyError::UnknownProperty {
        schema: schema.to_string(),
        prop: prop.to_string(),
    })?;
    Ok(pr.ptype.name().to_string())
}

impl Statement {
    /// The key statements group under: canonical ID, falling back to the
    /// entity ID.
    pub fn group_key(&self) -> &str {
        if self.canonical_id.is_empty() {
            &self.entity_id
        } else {
            &self.canonical_id
        }
    }

    /// Compute and set the content-derived ID.
    pub fn make_key(&mut self) -> &str {
        if let Some(id) = make_statement_key(
            &self.dataset,
            &self.entity_id,
            &self.prop,
            &self.value,
            self.external,
        ) {
            self.id = id;
        }
        &self.id
    }

    /// Normalize provenance fields: trim the entity ID, default the
    /// canonical ID to the entity ID and last-seen to first-seen.
    pub fn clean(&mut self) {
        self.entity_id = self.entity_id.trim().to_string();
        if self.canonical_id.is_empty() {
            self.canonical_id = self.entity_id.clone();
        }
        if self.last_seen.is_empty() {
            self.last_seen = self.first_seen.clone();
        }
    }
}

/// Decompose an entity into statements: one base-identity statement plus
/// one per property value. Entities without an ID emit nothing.
pub fn statements_from_entity(
    entity: &EntityProxy<'_>,
    dataset: &str,
    first_seen: &str,
    last_seen: &str,
    external: bool,
    origin: &str,
) -> Vec<Statement> {
    if entity.id.is_empty() {
        return Vec::new();
    }
    let last_seen = if last_seen.is_empty() {
        first_seen
    } else {
        last_seen
    };
    let make = |prop: &str, prop_type: &str, value: &str| {
        let mut s = Statement {
            entity_id: entity.id.clone(),
            canonical_id: entity.id.clone(),
            prop: prop.to_string(),
            prop_type: prop_type.to_string(),
            schema: entity.schema().name.clone(),
            value: value.to_string(),
            dataset: dataset.to_string(),
            external,
            first_seen: first_seen.to_string(),
            last_seen: last_seen.to_string(),
            origin: origin.to_string(),
            ..Default::default()
        };
        s.make_key();
        s
    };
    let mut out = vec![make(BASE_ID, BASE_ID, &entity.id)];
    for (prop, value) in entity.iter_values() {
        out.push(make(&prop.name, prop.ptype.name(), value));
    }
    out
}
