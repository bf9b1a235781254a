//! Error types for the client crate.
//!
//! Every failure is fatal to the call that raised it; nothing is retried
//! internally.

use metacpan_query::QueryError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum MetaCpanError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(code(metacpan_client::invalid_argument))]
    InvalidArgument(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedQuery(#[from] QueryError),

    #[error("Protocol error: {0}")]
    #[diagnostic(
        code(metacpan_client::protocol),
        help("The HTTP transport returned a response without the expected fields")
    )]
    Protocol(String),

    #[error("Request to {url} failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    #[diagnostic(
        code(metacpan_client::request_failed),
        help("Check the identifier and the configured API domain")
    )]
    RequestFailed { url: String, reason: Option<String> },

    #[error("Failed to decode response: {source}")]
    #[diagnostic(code(metacpan_client::decode), help("Raw content: {}", .content))]
    Decode {
        #[source]
        source: serde_json::Error,
        content: String,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(metacpan_client::config),
        help("Check your config.toml and METACPAN_* environment variables")
    )]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(metacpan_client::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(metacpan_client::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MetaCpanError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            MetaCpanError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_display() {
        let err = MetaCpanError::RequestFailed {
            url: "http://api.metacpan.org/v0/author/NOPE".into(),
            reason: Some("404 Not Found".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("http://api.metacpan.org/v0/author/NOPE"));
        assert!(msg.contains("404 Not Found"));

        let err = MetaCpanError::RequestFailed {
            url: "http://x".into(),
            reason: None,
        };
        assert_eq!(err.to_string(), "Request to http://x failed: no reason given");
    }

    #[test]
    fn test_query_error_is_transparent() {
        let err: MetaCpanError = QueryError::wrong_arity().into();
        assert_eq!(
            err.to_string(),
            "Malformed query: wrong number of query arguments"
        );
        assert!(matches!(err, MetaCpanError::MalformedQuery(_)));
    }

    #[test]
    fn test_with_context() {
        let res: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = res
            .with_context(|| "reading /etc/metacpan.toml".to_string())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error while reading /etc/metacpan.toml: denied"
        );
    }
}
