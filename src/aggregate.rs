//! Statement aggregation: reassembling entities from statement streams.
//!
//! Batch and streaming contracts are equivalent; the batch form sorts its
//! input by grouping key first, the streaming form requires pre-sorted
//! input and holds at most one in-progress entity.

use tracing::warn;

use crate::error::{Result, StatementError};
use crate::model::Model;
use crate::proxy::EntityProxy;
use crate::statement::{Statement, BASE_ID};

/// How to treat statements whose schema the model does not define.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownSchemaPolicy {
    /// Skip the statement, log a warning and count it.
    #[default]
    Drop,
    /// Abort the aggregation run.
    Fail,
}

/// The outcome of a batch aggregation run.
#[derive(Debug)]
pub struct Aggregation<'m> {
    pub entities: Vec<EntityProxy<'m>>,
    /// Statements skipped under [`UnknownSchemaPolicy::Drop`].
    pub dropped: usize,
}

/// Aggregate a batch of statements into entities. Input order does not
/// matter; output follows grouping-key order.
pub fn aggregate_statements(
    model: &Model,
    mut statements: Vec<Statement>,
    policy: UnknownSchemaPolicy,
) -> Result<Aggregation<'_>> {
    statements.sort_by(|a, b| a.group_key().cmp(b.group_key()));
    let mut agg = StatementAggregator::new(model, policy);
    let mut entities = Vec::new();
    for stmt in statements {
        if let Some(done) = agg.add(stmt)? {
            entities.push(done);
        }
    }
    if let Some(done) = agg.flush() {
        entities.push(done);
    }
    Ok(Aggregation {
        entities,
        dropped: agg.dropped(),
    })
}

/// Streaming aggregator over a key-sorted statement stream.
///
/// State is a single slot: the current grouping key and its in-progress
/// entity. A statement with a different key flushes the slot. Feeding an
/// unsorted stream silently fragments entities; ordering is the caller's
/// responsibility.
pub struct StatementAggregator<'m> {
    model: &'m Model,
    policy: UnknownSchemaPolicy,
    current: Option<EntityProxy<'m>>,
    key: String,
    dropped: usize,
}

impl<'m> StatementAggregator<'m> {
    pub fn new(model: &'m Model, policy: UnknownSchemaPolicy) -> Self {
        StatementAggregator {
            model,
            policy,
            current: None,
            key: String::new(),
            dropped: 0,
        }
    }

    /// The grouping key currently being accumulated, if any.
    pub fn current_key(&self) -> Option<&str> {
        self.current.as_ref().map(|_| self.key.as_str())
    }

    /// Statements skipped so far under the drop policy.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn skip(&mut self, stmt: &Statement) -> Result<()> {
        match self.policy {
            UnknownSchemaPolicy::Drop => {
                warn!(
                    schema = %stmt.schema,
                    entity_id = %stmt.entity_id,
                    "dropping statement with unknown schema"
                );
                self.dropped += 1;
                Ok(())
            }
            UnknownSchemaPolicy::Fail => Err(StatementError::UnknownSchema {
                schema: stmt.schema.clone(),
            }
            .into()),
        }
    }

    /// Consume one statement. Returns the completed previous entity when
    /// the grouping key changes.
    pub fn add(&mut self, stmt: Statement) -> Result<Option<EntityProxy<'m>>> {
        let key = stmt.group_key().to_string();
        let mut done = None;
        if self.current.is_none() || key != self.key {
            done = self.current.take();
            let Some(schema) = self.model.get(&stmt.schema) else {
                self.skip(&stmt)?;
                return Ok(done);
            };
            self.current = Some(EntityProxy::new(self.model, schema, key.clone()));
            self.key = key;
        }
        if stmt.prop != BASE_ID {
            if let Some(entity) = self.current.as_mut() {
                // Unknown properties happen when the stream's schema is
                // more specific than the group's first statement; values
                // that fail cleaning are skipped by the proxy anyway.
                let _ = entity.add_with(&stmt.prop, [stmt.value.as_str()], true, None);
            }
        }
        Ok(done)
    }

    /// Return the in-progress entity, if any, resetting the slot. Must be
    /// called once after the stream ends.
    pub fn flush(&mut self) -> Option<EntityProxy<'m>> {
        self.key.clear();
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(entity: &str, canonical: &str, prop: &str, value: &str) -> Statement {
        let mut s = Statement {
            entity_id: entity.into(),
            canonical_id: canonical.into(),
            prop: prop.into(),
            schema: "Person".into(),
            value: value.into(),
            dataset: "test".into(),
            ..Default::default()
        };
        s.make_key();
        s
    }

    #[test]
    fn streaming_yields_completed_groups_in_order() {
        let m = Model::bundled();
        let mut agg = StatementAggregator::new(&m, UnknownSchemaPolicy::default());
        let mut done = Vec::new();
        for s in [
            stmt("a", "", BASE_ID, "a"),
            stmt("a", "", "name", "Ana"),
            stmt("b", "", BASE_ID, "b"),
            stmt("b", "", "name", "Bob"),
        ] {
            if let Some(e) = agg.add(s).unwrap() {
                done.push(e);
            }
        }
        assert_eq!(done.len(), 1, "second group not complete before flush");
        done.extend(agg.flush());
        assert_eq!(done.len(), 2);
        assert_eq!(done[0].id, "a");
        assert_eq!(done[0].get("name"), ["Ana"]);
        assert_eq!(done[1].id, "b");
        assert_eq!(done[1].get("name"), ["Bob"]);
        assert!(agg.flush().is_none());
    }

    #[test]
    fn state_is_inspectable_between_calls() {
        let m = Model::bundled();
        let mut agg = StatementAggregator::new(&m, UnknownSchemaPolicy::default());
        assert_eq!(agg.current_key(), None);
        agg.add(stmt("a", "", "name", "Ana")).unwrap();
        assert_eq!(agg.current_key(), Some("a"));
        agg.flush();
        assert_eq!(agg.current_key(), None);
    }

    #[test]
    fn canonical_id_collapses_entities() {
        let m = Model::bundled();
        let stmts = vec![
            stmt("raw-1", "canon", "name", "Jane Doe"),
            stmt("raw-2", "canon", "nationality", "de"),
        ];
        let agg = aggregate_statements(&m, stmts, UnknownSchemaPolicy::default()).unwrap();
        assert_eq!(agg.entities.len(), 1);
        let e = &agg.entities[0];
        assert_eq!(e.id, "canon");
        assert_eq!(e.get("name"), ["Jane Doe"]);
        assert_eq!(e.get("nationality"), ["de"]);
    }

    #[test]
    fn batch_sorts_unordered_input() {
        let m = Model::bundled();
        let stmts = vec![
            stmt("b", "", "name", "Bob"),
            stmt("a", "", "name", "Ana"),
            stmt("b", "", "phone", "+493012345678"),
        ];
        let agg = aggregate_statements(&m, stmts, UnknownSchemaPolicy::default()).unwrap();
        assert_eq!(agg.entities.len(), 2);
        assert_eq!(agg.entities[0].id, "a");
        assert_eq!(agg.entities[1].id, "b");
        assert_eq!(agg.entities[1].get("phone"), ["+493012345678"]);
    }

    #[test]
    fn unknown_schema_dropped_and_counted() {
        let m = Model::bundled();
        let mut bad = stmt("x", "", "name", "Ghost");
        bad.schema = "Spaceship".into();
        let stmts = vec![bad, stmt("a", "", "name", "Ana")];
        let agg = aggregate_statements(&m, stmts, UnknownSchemaPolicy::Drop).unwrap();
        assert_eq!(agg.entities.len(), 1);
        assert_eq!(agg.dropped, 1);
    }

    #[test]
    fn unknown_schema_fails_under_strict_policy() {
        let m = Model::bundled();
        let mut bad = stmt("x", "", "name", "Ghost");
        bad.schema = "Spaceship".into();
        let res = aggregate_statements(&m, vec![bad], UnknownSchemaPolicy::Fail);
        assert!(res.is_err());
    }

    #[test]
    fn unsorted_stream_fragments_silently() {
        let m = Model::bundled();
        let mut agg = StatementAggregator::new(&m, UnknownSchemaPolicy::default());
        let mut done = Vec::new();
        for s in [
            stmt("a", "", "name", "Ana"),
            stmt("b", "", "name", "Bob"),
            stmt("a", "", "nationality", "de"),
        ] {
            done.extend(agg.add(s).unwrap());
        }
        done.extend(agg.flush());
        assert_eq!(done.len(), 3, "two fragments for entity a");
    }
}
