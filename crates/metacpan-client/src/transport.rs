//! The HTTP collaborator.
//!
//! The client only ever needs two capabilities from HTTP: a GET and a POST
//! with a body. [`HttpTransport`] captures exactly that, so tests and
//! embedders can inject their own implementation. [`UreqTransport`] is the
//! default.

use std::time::Duration;

use tracing::trace;
use ureq::{
    http::{header::CONTENT_TYPE, HeaderMap, Response, StatusCode},
    Agent, Body, Proxy, RequestBuilder,
};

use crate::decode::TransportResponse;

/// A minimal blocking HTTP client.
///
/// Implementations report every outcome, including network failures, as a
/// [`TransportResponse`]; they never panic on a failed exchange.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> TransportResponse;

    /// POSTs `content` as a JSON body.
    fn post(&self, url: &str, content: Vec<u8>) -> TransportResponse;
}

/// The default agent string, `metacpan-client/<version>`.
pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    /// Sets the default agent string and leaves proxy, headers and timeout
    /// unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use metacpan_client::transport::TransportConfig;
    ///
    /// let cfg = TransportConfig::default();
    /// assert!(cfg.user_agent.unwrap().starts_with("metacpan-client/"));
    /// assert!(cfg.proxy.is_none());
    /// assert!(cfg.timeout.is_none());
    /// ```
    fn default() -> Self {
        Self {
            user_agent: Some(default_user_agent()),
            headers: None,
            proxy: None,
            timeout: None,
        }
    }
}

impl TransportConfig {
    /// Builds a `ureq` agent from this configuration.
    ///
    /// Non-2xx statuses are returned as responses rather than errors so the
    /// transport can report them with their status line.
    pub fn build(&self) -> Agent {
        let mut config = Agent::config_builder()
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

/// [`HttpTransport`] backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    headers: Option<HeaderMap>,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            agent: config.build(),
            headers: config.headers.clone(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> TransportResponse {
        trace!("ureq GET {}", url);
        let req = apply_headers(self.agent.get(url), &self.headers);
        into_transport_response(req.call())
    }

    fn post(&self, url: &str, content: Vec<u8>) -> TransportResponse {
        trace!("ureq POST {} ({} bytes)", url, content.len());
        let req = apply_headers(self.agent.post(url), &self.headers)
            .header(CONTENT_TYPE, "application/json");
        into_transport_response(req.send(content.as_slice()))
    }
}

/// Apply headers from an optional `HeaderMap` to a `RequestBuilder`.
fn apply_headers<B>(mut req: RequestBuilder<B>, headers: &Option<HeaderMap>) -> RequestBuilder<B> {
    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
    }
    req
}

fn into_transport_response(result: Result<Response<Body>, ureq::Error>) -> TransportResponse {
    let resp = match result {
        Ok(resp) => resp,
        Err(err) => {
            trace!("request failed: {}", err);
            return TransportResponse::failed(err.to_string());
        }
    };

    let status = resp.status();
    if !status.is_success() {
        return TransportResponse::failed(status_line(status));
    }

    match resp.into_body().read_to_vec() {
        Ok(content) => TransportResponse::ok(content),
        Err(err) => TransportResponse::failed(format!("reading response body: {err}")),
    }
}

/// `"404 Not Found"`, or just the code when it has no canonical reason.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
