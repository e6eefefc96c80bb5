//! Diagnostic error types for the entigraph data model.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so pipeline operators know exactly which
//! record or schema definition is at fault.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the entigraph crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum EntigraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Model errors (load-fatal conditions)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("duplicate schema name: {name}")]
    #[diagnostic(
        code(entigraph::model::duplicate_schema),
        help(
            "Two schema specifications share the same name. Schema names are \
             globally unique across all loaded sources — rename one of them."
        )
    )]
    DuplicateSchema { name: String },

    #[error("schema {child} extends unknown schema {parent}")]
    #[diagnostic(
        code(entigraph::model::unknown_parent),
        help(
            "Every parent named in `extends` must be defined somewhere in the \
             same model. Check for typos, or make sure the source declaring the \
             parent schema is part of the loaded set."
        )
    )]
    UnknownParent { child: String, parent: String },

    #[error("inheritance cycle through schema {name}")]
    #[diagnostic(
        code(entigraph::model::inheritance_cycle),
        help(
            "The `extends` declarations form a cycle. Schema ancestry must be a \
             directed acyclic graph."
        )
    )]
    InheritanceCycle { name: String },

    #[error("property {qname} references unknown range schema {range}")]
    #[diagnostic(
        code(entigraph::model::unknown_range),
        help(
            "An entity-reference property names a range schema that is not part \
             of this model. Define the target schema or remove the range."
        )
    )]
    UnknownRange { qname: String, range: String },

    #[error("schema not found: {name}")]
    #[diagnostic(
        code(entigraph::model::schema_not_found),
        help("No schema with this name is defined in the model.")
    )]
    SchemaNotFound { name: String },

    #[error("no common schema between {left} and {right}")]
    #[diagnostic(
        code(entigraph::model::no_common_schema),
        help(
            "Two entities can only be merged when one schema is an ancestor of \
             the other. This usually means two unrelated entities ended up \
             sharing an ID or canonical ID."
        )
    )]
    NoCommonSchema { left: String, right: String },

    #[error("failed to parse schema specification: {message}")]
    #[diagnostic(
        code(entigraph::model::spec_parse),
        help("The YAML/JSON schema specification is malformed. Check the syntax.")
    )]
    SpecParse { message: String },
}

// ---------------------------------------------------------------------------
// Proxy errors (write-rejected and schema-mismatch conditions)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProxyError {
    #[error("unknown property {prop} on schema {schema}")]
    #[diagnostic(
        code(entigraph::proxy::unknown_property),
        help(
            "The property is not declared on this schema or any of its \
             ancestors. Check the property name, or use a more specific schema."
        )
    )]
    UnknownProperty { schema: String, prop: String },

    #[error("property {qname} is a reverse stub and cannot be written")]
    #[diagnostic(
        code(entigraph::proxy::stub_write),
        help(
            "Reverse stubs exist only so relationships can be walked backwards. \
             Write to the forward property on the owning schema instead."
        )
    )]
    StubWrite { qname: String },

    #[error("required property missing: {prop}")]
    #[diagnostic(
        code(entigraph::proxy::required_missing),
        help("The schema marks this property as required; supply at least one value.")
    )]
    RequiredMissing { prop: String },

    #[error("invalid value for property {prop}: {value:?}")]
    #[diagnostic(
        code(entigraph::proxy::invalid_value),
        help("The value failed the property type's validation.")
    )]
    InvalidValue { prop: String, value: String },
}

// ---------------------------------------------------------------------------
// Statement errors (codec-level conditions)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StatementError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(entigraph::statement::io),
        help("Reading or writing the statement stream failed at the transport level.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("malformed statement record: {message}")]
    #[diagnostic(
        code(entigraph::statement::malformed),
        help(
            "A record in the stream could not be decoded. Codec reads stop at \
             the first malformed record; there is no partial-record recovery."
        )
    )]
    Malformed { message: String },

    #[error("statement references unknown schema {schema}")]
    #[diagnostic(
        code(entigraph::statement::unknown_schema),
        help(
            "The statement names a schema the active model does not define. \
             Under UnknownSchemaPolicy::Fail this aborts the aggregation run; \
             under Drop the statement is skipped and counted."
        )
    )]
    UnknownSchema { schema: String },
}

impl From<std::io::Error> for StatementError {
    fn from(source: std::io::Error) -> Self {
        StatementError::Io { source }
    }
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {id}")]
    #[diagnostic(
        code(entigraph::graph::node_not_found),
        help("No node with this ID has been registered in the graph.")
    )]
    NodeNotFound { id: String },
}

/// Convenience alias for functions returning entigraph results.
pub type Result<T> = std::result::Result<T, EntigraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_converts_to_entigraph_error() {
        let err = ModelError::UnknownParent {
            child: "Person".into(),
            parent: "LegalEntity".into(),
        };
        let top: EntigraphError = err.into();
        assert!(matches!(
            top,
            EntigraphError::Model(ModelError::UnknownParent { .. })
        ));
    }

    #[test]
    fn proxy_error_converts_to_entigraph_error() {
        let err = ProxyError::StubWrite {
            qname: "Person:ownershipOwner".into(),
        };
        let top: EntigraphError = err.into();
        assert!(matches!(
            top,
            EntigraphError::Proxy(ProxyError::StubWrite { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ModelError::NoCommonSchema {
            left: "Person".into(),
            right: "Vessel".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Person"));
        assert!(msg.contains("Vessel"));
    }
}
