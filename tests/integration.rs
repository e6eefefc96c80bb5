//! End-to-end integration tests for the entigraph data model.
//!
//! These tests exercise the full pipeline from entity construction through
//! statement decomposition, serialization, aggregation and graph projection,
//! validating that the model, proxy and statement layers work together.

use std::collections::BTreeSet;
use std::io::BufReader;

use entigraph::aggregate::{aggregate_statements, StatementAggregator, UnknownSchemaPolicy};
use entigraph::error::{EntigraphError, ProxyError};
use entigraph::graph::Graph;
use entigraph::model::Model;
use entigraph::namespace::Namespace;
use entigraph::proxy::EntityProxy;
use entigraph::statement::{io as stio, statements_from_entity, Statement, BASE_ID};
use entigraph::types::registry::registry;

fn person<'m>(model: &'m Model, id: &str, name: &str) -> EntityProxy<'m> {
    let mut entity = EntityProxy::new(model, model.schema("Person").unwrap(), id);
    entity.add("name", [name]).unwrap();
    entity
}

#[test]
fn inherited_properties_are_visible_on_descendants() {
    let model = Model::bundled();
    let company = model.schema("Company").unwrap();

    // Declared three levels up, on Thing.
    let name = company.get("name").unwrap();
    assert_eq!(name.qname, "Thing:name");
    // Declared on LegalEntity.
    assert!(company.get("registrationNumber").is_some());
    // The reverse stub synthesized from Ownership.owner reaches Company
    // through the LegalEntity range.
    let stub = company.get("ownershipOwner").unwrap();
    assert!(stub.stub);
    assert_eq!(stub.range.as_deref(), Some("Ownership"));

    assert!(company.is_a("Thing"));
    assert!(company.is_a("LegalEntity"));
    assert!(!company.is_a("Person"));
}

#[test]
fn stub_properties_reject_writes_but_allow_reads() {
    let model = Model::bundled();
    let mut entity = person(&model, "p1", "Jane Doe");

    assert!(entity.get("ownershipOwner").is_empty());
    let err = entity.add("ownershipOwner", ["own-1"]).unwrap_err();
    assert!(matches!(
        err,
        EntigraphError::Proxy(ProxyError::StubWrite { .. })
    ));
}

#[test]
fn cleaning_pipeline_normalizes_email_and_phone() {
    let model = Model::bundled();
    let mut entity = person(&model, "p1", "Jürgen Schmidt");
    entity.add("country", ["DE"]).unwrap();
    entity
        .add("email", ["John <j.smith@bücher.de>"])
        .unwrap();
    // National number, region inferred from the entity's country.
    entity.add("phone", ["030 123456"]).unwrap();

    assert_eq!(entity.get("email"), ["j.smith@xn--bcher-kva.de"]);
    assert_eq!(entity.get("phone"), ["+4930123456"]);
}

#[test]
fn url_comparison_ignores_query_order_and_fragment() {
    let url = registry().get("url").unwrap();
    let left = url.clean("Example.com/Path?b=2&a=1#frag", false, None, None).unwrap();
    let right = url
        .clean("http://example.com/Path?a=1&b=2", false, None, None)
        .unwrap();
    assert_eq!(url.compare(&left, &right), 1.0);
}

#[test]
fn iban_cleaning_is_canonical_and_checksummed() {
    let identifier = registry().get("identifier").unwrap();
    let cleaned = identifier
        .clean("DE44 5001 0517 5407 3249 31", false, Some("iban"), None)
        .unwrap();
    assert_eq!(cleaned, "DE44500105175407324931");
    // Any single-character corruption breaks the mod-97 checksum.
    assert_eq!(
        identifier.clean("DE44500105175407324932", false, Some("iban"), None),
        None
    );
}

#[test]
fn statement_ids_are_idempotent() {
    let model = Model::bundled();
    let entity = person(&model, "p1", "Jane Doe");
    let first = statements_from_entity(&entity, "test", "2024-01-01", "", false, "");
    let second = statements_from_entity(&entity, "test", "2024-06-01", "", false, "");

    let ids = |stmts: &[Statement]| -> BTreeSet<String> {
        stmts.iter().map(|s| s.id.clone()).collect()
    };
    // Provenance timestamps do not participate in the content hash.
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn decompose_then_aggregate_round_trips() {
    let model = Model::bundled();
    let mut entity = person(&model, "p1", "Jane Doe");
    entity.add("email", ["jane@example.org"]).unwrap();
    entity.add("nationality", ["fr"]).unwrap();

    let statements = statements_from_entity(&entity, "test", "2024-01-01", "", false, "");
    let result = aggregate_statements(&model, statements, UnknownSchemaPolicy::Fail).unwrap();

    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.dropped, 0);
    let back = &result.entities[0];
    assert_eq!(back.id, entity.id);
    assert_eq!(back.schema().name, "Person");
    assert_eq!(back.get("name"), entity.get("name"));
    assert_eq!(back.get("email"), entity.get("email"));
    assert_eq!(back.get("nationality"), entity.get("nationality"));
}

#[test]
fn canonical_ids_collapse_fragments_into_one_entity() {
    let model = Model::bundled();
    let mut statements = Vec::new();
    for (entity_id, prop, value) in [
        ("frag-a", "name", "Jane Doe"),
        ("frag-b", "name", "DOE, Jane"),
        ("frag-b", "email", "jane@example.org"),
    ] {
        let mut s = Statement {
            entity_id: entity_id.into(),
            canonical_id: "canon-1".into(),
            prop: prop.into(),
            schema: "Person".into(),
            value: value.into(),
            dataset: "test".into(),
            ..Default::default()
        };
        s.make_key();
        statements.push(s);
    }

    let result = aggregate_statements(&model, statements, UnknownSchemaPolicy::Fail).unwrap();
    assert_eq!(result.entities.len(), 1);
    let entity = &result.entities[0];
    assert_eq!(entity.id, "canon-1");
    let names: BTreeSet<&str> = entity.get("name").iter().map(String::as_str).collect();
    assert_eq!(names, BTreeSet::from(["Jane Doe", "DOE, Jane"]));
}

#[test]
fn unknown_schemata_are_dropped_or_fatal_by_policy() {
    let model = Model::bundled();
    let mut bad = Statement {
        entity_id: "x".into(),
        prop: "name".into(),
        schema: "Cryptid".into(),
        value: "Nessie".into(),
        dataset: "test".into(),
        ..Default::default()
    };
    bad.make_key();

    let result =
        aggregate_statements(&model, vec![bad.clone()], UnknownSchemaPolicy::Drop).unwrap();
    assert!(result.entities.is_empty());
    assert_eq!(result.dropped, 1);

    assert!(aggregate_statements(&model, vec![bad], UnknownSchemaPolicy::Fail).is_err());
}

#[test]
fn streaming_aggregation_completes_groups_on_key_change() {
    let model = Model::bundled();
    let entities = [person(&model, "a", "Ana"), person(&model, "b", "Bob")];
    let mut agg = StatementAggregator::new(&model, UnknownSchemaPolicy::Drop);

    let mut done = Vec::new();
    for entity in &entities {
        for stmt in statements_from_entity(entity, "test", "2024-01-01", "", false, "") {
            if let Some(complete) = agg.add(stmt).unwrap() {
                done.push(complete);
            }
        }
    }
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, "a");
    done.extend(agg.flush());
    assert_eq!(done.len(), 2);
    assert_eq!(done[1].id, "b");
    assert_eq!(done[1].caption(), "Bob");
}

#[test]
fn jsonl_round_trip_preserves_statements() {
    let model = Model::bundled();
    let entity = person(&model, "p1", "Jane Doe");
    let statements = statements_from_entity(&entity, "test", "2024-01-01", "", false, "");

    let mut buf = Vec::new();
    stio::write_jsonl(&mut buf, statements.clone()).unwrap();

    let mut read = Vec::new();
    stio::read_jsonl(BufReader::new(&buf[..]), Some(&model), |s| {
        read.push(s);
        Ok(())
    })
    .unwrap();

    assert_eq!(read.len(), statements.len());
    let ids: BTreeSet<&str> = statements.iter().map(|s| s.id.as_str()).collect();
    let read_ids: BTreeSet<&str> = read.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, read_ids);
    // The base-identity statement survives the trip.
    assert!(read.iter().any(|s| s.prop == BASE_ID));
}

#[test]
fn ownership_edge_projects_into_the_graph() {
    let model = Model::bundled();
    let owner = person(&model, "p1", "Jane Doe");
    let mut company = EntityProxy::new(&model, model.schema("Company").unwrap(), "c1");
    company.add("name", ["Acme Holdings Ltd."]).unwrap();

    let mut own = EntityProxy::new(&model, model.schema("Ownership").unwrap(), "o1");
    own.add("owner", ["p1"]).unwrap();
    own.add("asset", ["c1"]).unwrap();
    own.add("percentage", ["51"]).unwrap();

    let mut graph = Graph::new();
    graph.add(&owner);
    graph.add(&company);
    graph.add(&own);

    let entity_nodes: Vec<_> = graph.nodes().filter(|n| n.is_entity()).collect();
    assert_eq!(entity_nodes.len(), 2);
    assert_eq!(graph.node("p1").unwrap().caption(), "Jane Doe");

    let relationship = graph
        .edges()
        .find(|e| e.schema.as_deref() == Some("Ownership"))
        .expect("ownership edge present");
    assert_eq!(relationship.source_id, "p1");
    assert_eq!(relationship.target_id, "c1");
}

#[test]
fn namespace_signing_survives_entity_rewrite() {
    let model = Model::bundled();
    let ns = Namespace::new("my_dataset");

    let mut own = EntityProxy::new(&model, model.schema("Ownership").unwrap(), "o1");
    own.add("owner", ["p1"]).unwrap();
    own.add("asset", ["c1"]).unwrap();

    let signed = ns.apply(&own, false);
    assert!(ns.verify(&signed.id));
    for value in signed.get("owner") {
        assert!(ns.verify(value));
    }
    // Re-signing under another namespace replaces the signature.
    let other = Namespace::new("other_dataset");
    let resigned = other.sign(&signed.id);
    assert!(other.verify(&resigned));
    assert!(!ns.verify(&resigned));
}

#[test]
fn statement_entity_keeps_provenance_and_referents() {
    let model = Model::bundled();
    let mut entity =
        entigraph::statement::entity::StatementEntity::new(&model, "test", "Person", "canon-1")
            .unwrap();

    let mut base = Statement {
        entity_id: "frag-a".into(),
        prop: BASE_ID.into(),
        schema: "Person".into(),
        value: "frag-a".into(),
        dataset: "test".into(),
        first_seen: "2024-03-01".into(),
        ..Default::default()
    };
    base.make_key();
    entity.add_statement(base).unwrap();

    let mut name = Statement {
        entity_id: "frag-a".into(),
        prop: "name".into(),
        schema: "Person".into(),
        value: "Jane Doe".into(),
        dataset: "test".into(),
        ..Default::default()
    };
    name.make_key();
    entity.add_statement(name).unwrap();

    assert_eq!(entity.get("name"), ["Jane Doe"]);
    assert_eq!(entity.referents(), ["frag-a"]);
    assert_eq!(entity.last_change(), Some("2024-03-01"));

    // Emitted statements carry the canonical ID and a synthesized base.
    let out = entity.statements();
    assert!(out.iter().all(|s| s.canonical_id == "canon-1"));
    assert!(out.iter().any(|s| s.prop == BASE_ID));
}

#[test]
fn model_loads_from_a_directory_of_yaml_files() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("base.yml"),
        "Thing:\n  label: Thing\n  properties:\n    name:\n      label: Name\n      type: name\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("person.yml"),
        "Person:\n  label: Person\n  extends: [Thing]\n",
    )
    .unwrap();

    let model = Model::from_dir(dir.path()).unwrap();
    let person = model.schema("Person").unwrap();
    assert!(person.get("name").is_some());
    assert!(person.is_a("Thing"));
}

#[test]
fn merge_widens_schema_to_the_common_descendant() {
    let model = Model::bundled();
    let mut legal = EntityProxy::new(&model, model.schema("LegalEntity").unwrap(), "e1");
    legal.add("name", ["Acme"]).unwrap();
    let mut company = EntityProxy::new(&model, model.schema("Company").unwrap(), "e1");
    company.add("ticker", ["ACME"]).unwrap();

    legal.merge(&company).unwrap();
    assert_eq!(legal.schema().name, "Company");
    assert_eq!(legal.get("name"), ["Acme"]);
    assert_eq!(legal.get("ticker"), ["ACME"]);
}
