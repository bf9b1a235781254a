//! Query DSL for the MetaCPAN search backend.
//!
//! Queries are small nested trees:
//!
//! - `{"all": [..]}` matches when every sub-query matches
//! - `{"either": [..]}` matches when at least one sub-query matches
//! - `{"<field>": "<value>"}` matches a single field; `*` and `?` in the
//!   value turn it into a wildcard match
//!
//! [`compile`] turns such a tree into the boolean-query document the search
//! backend understands, and [`search_body`] wraps it as a request body.
//!
//! # Example
//!
//! ```
//! use metacpan_query::search_body;
//! use serde_json::json;
//!
//! let body = search_body(&json!({
//!     "either": [{ "name": "Moose" }, { "name": "Moo*" }]
//! }))
//! .unwrap();
//!
//! assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);
//! ```

pub mod compile;
pub mod error;
pub mod query;

pub use compile::{compile, search_body};
pub use error::{QueryError, Result};
pub use query::{MatchKind, Query};
