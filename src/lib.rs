//! # entigraph
//!
//! A typed entity data model for investigative data: schema definitions
//! with multiple inheritance, value normalization through pluggable
//! property types, decomposition of entities into provenance-carrying
//! statements, and re-aggregation of statement streams into entities.
//!
//! ## Components
//!
//! - **Schema model** (`model`): YAML-defined entity classes resolved
//!   over a multiple-inheritance DAG, with reverse-link stubs
//! - **Property types** (`types`): ~20 value types (names, dates, IBANs,
//!   IDN domains, E.164 phones, ...) with cleaning and comparison
//! - **Entity proxy** (`proxy`): a live entity instance enforcing the
//!   schema's write rules
//! - **Statements** (`statement`): content-addressed atomic facts with
//!   JSON-lines, tabular and compact binary codecs
//! - **Aggregation** (`aggregate`): batch and bounded-memory streaming
//!   reassembly of entities from statement streams
//! - **Graph** (`graph`): property-graph projection with reified value
//!   nodes weighted by specificity
//! - **Namespaces** (`namespace`): HMAC signatures partitioning entity
//!   IDs between datasets
//!
//! ## Library usage
//!
//! ```
//! use entigraph::model::Model;
//! use entigraph::proxy::EntityProxy;
//! use entigraph::statement::statements_from_entity;
//!
//! let model = Model::bundled();
//! let schema = model.get("Person").unwrap();
//! let mut person = EntityProxy::new(&model, schema, "");
//! person.make_id(["acme", "staff", "17"]);
//! person.add("name", ["Jane Doe"]).unwrap();
//! person.add("email", ["jane@example.com"]).unwrap();
//! let statements = statements_from_entity(&person, "demo", "2024-01-01", "", false, "");
//! assert_eq!(statements.len(), 3);
//! ```

pub mod aggregate;
pub mod error;
pub mod graph;
pub mod model;
pub mod namespace;
pub mod proxy;
pub mod statement;
pub mod text;
pub mod types;

pub use aggregate::{aggregate_statements, StatementAggregator, UnknownSchemaPolicy};
pub use error::{EntigraphError, Result};
pub use model::Model;
pub use namespace::Namespace;
pub use proxy::EntityProxy;
pub use statement::{Statement, statements_from_entity};
