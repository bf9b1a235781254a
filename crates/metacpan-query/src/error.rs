use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while validating a query tree.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Malformed query: {0}")]
    #[diagnostic(
        code(metacpan_query::malformed),
        help(
            "Each node must be a single-key object: {{\"all\": [..]}}, \
             {{\"either\": [..]}} or {{\"field\": \"value\"}}"
        )
    )]
    Malformed(String),
}

impl QueryError {
    /// A node that does not carry exactly one key.
    pub fn wrong_arity() -> Self {
        Self::Malformed("wrong number of query arguments".into())
    }

    /// An `all`/`either` node whose value is not a sequence.
    pub fn wrong_combinator_type() -> Self {
        Self::Malformed("wrong type for combinator".into())
    }

    /// A leaf whose value is not a usable string.
    pub fn wrong_argument_type() -> Self {
        Self::Malformed("wrong type of query arguments".into())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
