//! Translation of [`Query`] trees into backend boolean-query documents.

use serde_json::{json, Map, Value};
use tracing::trace;

use crate::{
    error::Result,
    query::{MatchKind, Query},
};

impl Query {
    /// Translates the tree into a boolean-query document.
    ///
    /// `all` becomes `bool.must`, `either` becomes `bool.should` with
    /// `minimum_should_match: 1`, and leaves become `term` or `wildcard`
    /// queries. Sub-query order is preserved.
    pub fn to_document(&self) -> Value {
        match self {
            Self::All(children) => {
                json!({
                    "bool": {
                        "must": compile_list(children),
                    }
                })
            }
            Self::Either(children) => {
                json!({
                    "bool": {
                        "should": compile_list(children),
                        "minimum_should_match": 1,
                    }
                })
            }
            Self::Match { field, value } => {
                let mut clause = Map::new();
                clause.insert(field.clone(), Value::String(value.clone()));

                let mut leaf = Map::new();
                leaf.insert(
                    MatchKind::of(value).as_str().to_string(),
                    Value::Object(clause),
                );
                Value::Object(leaf)
            }
        }
    }

    /// The compiled document wrapped as a search request body.
    pub fn to_search_body(&self) -> Value {
        json!({ "query": self.to_document() })
    }
}

fn compile_list(children: &[Query]) -> Vec<Value> {
    children.iter().map(Query::to_document).collect()
}

/// Validates a JSON query node and compiles it.
///
/// # Errors
///
/// Returns [`QueryError::Malformed`](crate::QueryError::Malformed) on the
/// first structural violation found in a pre-order walk of the tree.
///
/// # Examples
///
/// ```
/// use metacpan_query::compile;
/// use serde_json::json;
///
/// let doc = compile(&json!({ "name": "Moo*" })).unwrap();
/// assert_eq!(doc, json!({ "wildcard": { "name": "Moo*" } }));
/// ```
pub fn compile(node: &Value) -> Result<Value> {
    let document = Query::try_from(node)?.to_document();
    trace!("compiled query: {document}");
    Ok(document)
}

/// Validates a JSON query node and returns the full search body,
/// `{"query": <compiled document>}`.
pub fn search_body(node: &Value) -> Result<Value> {
    let body = Query::try_from(node)?.to_search_body();
    trace!("search body: {body}");
    Ok(body)
}
