//! Statement-preserving entities.
//!
//! Unlike [`EntityProxy`](crate::proxy::EntityProxy), which flattens into
//! deduplicated values, a [`StatementEntity`] retains every statement it
//! absorbs, keyed by property then statement ID. Duplicate or conflicting
//! provenance for the same property survives intact.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ProxyError, Result};
use crate::model::schema::Schema;
use crate::model::Model;
use crate::statement::{Statement, BASE_ID};

#[derive(Debug, Clone)]
pub struct StatementEntity<'m> {
    model: &'m Model,
    schema: &'m Schema,
    pub id: String,
    /// Default dataset for statements created through [`StatementEntity::add`].
    pub dataset: String,
    /// prop name -> statement ID -> statement.
    stmts: BTreeMap<String, BTreeMap<String, Statement>>,
    /// Entity IDs other than our own that fed into this entity.
    extra_referents: BTreeSet<String>,
    /// Latest first-seen among absorbed base-identity statements.
    last_change: String,
}

impl<'m> StatementEntity<'m> {
    pub fn new(
        model: &'m Model,
        dataset: impl Into<String>,
        schema_name: &str,
        id: impl Into<String>,
    ) -> Result<Self> {
        let schema = model.schema(schema_name)?;
        Ok(StatementEntity {
            model,
            schema,
            id: id.into(),
            dataset: dataset.into(),
            stmts: BTreeMap::new(),
            extra_referents: BTreeSet::new(),
            last_change: String::new(),
        })
    }

    pub fn schema(&self) -> &'m Schema {
        self.schema
    }

    pub fn last_change(&self) -> Option<&str> {
        (!self.last_change.is_empty()).then_some(self.last_change.as_str())
    }

    /// IDs of source entities merged into this one, sorted.
    pub fn referents(&self) -> Vec<&str> {
        self.extra_referents.iter().map(String::as_str).collect()
    }

    /// Absorb one statement, widening the schema to the common schema when
    /// the statement's schema differs. Incomparable schemata fail.
    pub fn add_statement(&mut self, mut stmt: Statement) -> Result<()> {
        if self.schema.name != stmt.schema && !self.schema.is_a(&stmt.schema) {
            let other = self.model.schema(&stmt.schema)?;
            self.schema = self.model.common_schema(self.schema, other)?;
        }
        if stmt.prop == BASE_ID {
            if !stmt.first_seen.is_empty() && stmt.first_seen > self.last_change {
                self.last_change = stmt.first_seen.clone();
            }
            return Ok(());
        }
        if stmt.id.is_empty() {
            stmt.make_key();
        }
        if stmt.prop_type.is_empty() {
            if let Ok(name) = super::prop_type_name(self.model, &stmt.schema, &stmt.prop) {
                stmt.prop_type = name;
            }
        }
        if stmt.canonical_id.is_empty() && !self.id.is_empty() {
            stmt.canonical_id = self.id.clone();
        }
        if !stmt.entity_id.is_empty() && stmt.entity_id != self.id {
            self.extra_referents.insert(stmt.entity_id.clone());
        }
        self.stmts
            .entry(stmt.prop.clone())
            .or_default()
            .insert(stmt.id.clone(), stmt);
        Ok(())
    }

    /// Clean a raw value through the property's type and absorb it as a
    /// new statement. Values the type rejects are skipped without error.
    pub fn add(
        &mut self,
        prop_name: &str,
        value: &str,
        lang: &str,
        original: &str,
        origin: &str,
        seen: &str,
    ) -> Result<()> {
        let prop = self.schema.get(prop_name).ok_or_else(|| {
            ProxyError::UnknownProperty {
                schema: self.schema.name.clone(),
                prop: prop_name.to_string(),
            }
        })?;
        if prop.stub {
            return Err(ProxyError::StubWrite {
                qname: prop.qname.clone(),
            }
            .into());
        }
        let Some(clean) = prop
            .ptype
            .clean(value, false, prop.format.as_deref(), None)
        else {
            return Ok(());
        };
        let mut stmt = Statement {
            entity_id: self.id.clone(),
            canonical_id: self.id.clone(),
            prop: prop.name.clone(),
            prop_type: prop.ptype.name().to_string(),
            schema: self.schema.name.clone(),
            value: clean,
            dataset: self.dataset.clone(),
            lang: lang.to_string(),
            original_value: original.to_string(),
            origin: origin.to_string(),
            first_seen: seen.to_string(),
            ..Default::default()
        };
        stmt.make_key();
        self.add_statement(stmt)
    }

    /// All values currently held for a property, in statement-ID order.
    pub fn get(&self, prop: &str) -> Vec<&str> {
        self.stmts
            .get(prop)
            .map(|by_id| by_id.values().map(|s| s.value.as_str()).collect())
            .unwrap_or_default()
    }

    /// Emit all statements in deterministic order, appending a synthesized
    /// base-identity statement covering the earliest first-seen and latest
    /// last-seen across the held set.
    pub fn statements(&self) -> Vec<Statement> {
        let mut out = Vec::new();
        let mut first_seen = String::new();
        let mut last_seen = String::new();
        for by_id in self.stmts.values() {
            for stmt in by_id.values() {
                if !stmt.last_seen.is_empty() && stmt.last_seen > last_seen {
                    last_seen = stmt.last_seen.clone();
                }
                if !stmt.first_seen.is_empty()
                    && (first_seen.is_empty() || stmt.first_seen < first_seen)
                {
                    first_seen = stmt.first_seen.clone();
                }
                out.push(stmt.clone());
            }
        }
        if !self.id.is_empty() {
            if first_seen.is_empty() {
                first_seen = self.last_change.clone();
            }
            let mut base = Statement {
                entity_id: self.id.clone(),
                canonical_id: self.id.clone(),
                prop: BASE_ID.to_string(),
                prop_type: BASE_ID.to_string(),
                schema: self.schema.name.clone(),
                value: self.id.clone(),
                dataset: self.dataset.clone(),
                first_seen,
                last_seen,
                ..Default::default()
            };
            base.make_key();
            out.push(base);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity<'m>(model: &'m Model) -> StatementEntity<'m> {
        StatementEntity::new(model, "test", "LegalEntity", "e1").unwrap()
    }

    fn stmt(prop: &str, value: &str, schema: &str) -> Statement {
        let mut s = Statement {
            entity_id: "e1".into(),
            prop: prop.into(),
            schema: schema.into(),
            value: value.into(),
            dataset: "test".into(),
            first_seen: "2024-01-01".into(),
            last_seen: "2024-02-01".into(),
            ..Default::default()
        };
        s.make_key();
        s
    }

    #[test]
    fn duplicate_provenance_is_retained() {
        let m = Model::bundled();
        let mut e = entity(&m);
        let mut a = stmt("name", "Acme", "LegalEntity");
        a.dataset = "one".into();
        a.make_key();
        let mut b = stmt("name", "Acme", "LegalEntity");
        b.dataset = "two".into();
        b.make_key();
        e.add_statement(a).unwrap();
        e.add_statement(b).unwrap();
        assert_eq!(e.get("name"), vec!["Acme", "Acme"]);
    }

    #[test]
    fn schema_widens_on_mismatch() {
        let m = Model::bundled();
        let mut e = entity(&m);
        e.add_statement(stmt("birthDate", "1980-01-01", "Person")).unwrap();
        assert_eq!(e.schema().name, "Person");
    }

    #[test]
    fn incomparable_schema_fails() {
        let m = Model::bundled();
        let mut e = StatementEntity::new(&m, "test", "Person", "e1").unwrap();
        let res = e.add_statement(stmt("startDate", "2001", "Ownership"));
        assert!(res.is_err());
    }

    #[test]
    fn referents_track_foreign_entity_ids() {
        let m = Model::bundled();
        let mut e = entity(&m);
        let mut s = stmt("name", "Acme", "LegalEntity");
        s.entity_id = "other-1".into();
        s.make_key();
        e.add_statement(s).unwrap();
        assert_eq!(e.referents(), vec!["other-1"]);
    }

    #[test]
    fn base_statement_tracks_last_change() {
        let m = Model::bundled();
        let mut e = entity(&m);
        let mut base = stmt(BASE_ID, "e1", "LegalEntity");
        base.first_seen = "2024-05-01".into();
        e.add_statement(base).unwrap();
        assert_eq!(e.last_change(), Some("2024-05-01"));
    }

    #[test]
    fn emitted_statements_append_synthesized_base() {
        let m = Model::bundled();
        let mut e = entity(&m);
        let mut early = stmt("name", "Acme", "LegalEntity");
        early.first_seen = "2023-01-01".into();
        early.make_key();
        let mut late = stmt("email", "info@example.com", "LegalEntity");
        late.last_seen = "2025-01-01".into();
        late.make_key();
        e.add_statement(early).unwrap();
        e.add_statement(late).unwrap();
        let out = e.statements();
        let base = out.last().unwrap();
        assert_eq!(base.prop, BASE_ID);
        assert_eq!(base.first_seen, "2023-01-01");
        assert_eq!(base.last_seen, "2025-01-01");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn add_cleans_through_the_type() {
        let m = Model::bundled();
        let mut e = entity(&m);
        e.add("email", "Info@Example.com", "", "", "unit", "2024-01-01").unwrap();
        assert_eq!(e.get("email"), vec!["info@example.com"]);
        // Rejected values are skipped, not errors.
        e.add("email", "not-an-email", "", "", "unit", "2024-01-01").unwrap();
        assert_eq!(e.get("email").len(), 1);
    }
}
