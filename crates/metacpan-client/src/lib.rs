//! Blocking client for the MetaCPAN metadata and search API.
//!
//! [`Client`] covers single-document lookups (authors, releases, modules,
//! distributions) and scrolling searches. Searches take the query DSL from
//! [`metacpan_query`]; the compiled request is only sent when the first page
//! is pulled from the returned [`ScrollSession`].
//!
//! HTTP is done through the [`HttpTransport`] trait and the search protocol
//! through [`SearchBackend`], so both can be replaced in tests or by
//! embedders.
//!
//! ```no_run
//! use metacpan_client::{entity::Release, Client};
//! use serde_json::json;
//!
//! let client = Client::new()?;
//! for release in client.search::<Release>(&json!({
//!     "all": [{ "distribution": "Moose" }, { "status": "latest" }]
//! }))? {
//!     println!("{}", release?.name);
//! }
//! # Ok::<(), metacpan_client::MetaCpanError>(())
//! ```

pub mod client;
pub mod config;
pub mod decode;
pub mod entity;
pub mod error;
pub mod result_set;
pub mod scroll;
pub mod time;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use decode::{decode, TransportResponse};
pub use entity::Entity;
pub use error::{MetaCpanError, Result};
pub use metacpan_query::{compile, search_body, Query, QueryError};
pub use result_set::ResultSet;
pub use scroll::{
    HttpSearchBackend, ScrollOptions, ScrollPage, ScrollRequest, ScrollSession, SearchBackend,
};
pub use transport::{HttpTransport, UreqTransport};
