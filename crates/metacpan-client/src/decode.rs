//! Validation and JSON decoding of raw transport responses.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetaCpanError, Result};

/// The outcome of one HTTP exchange, as reported by an
/// [`HttpTransport`](crate::transport::HttpTransport).
///
/// All fields are optional so that a misbehaving transport can be detected
/// instead of trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub success: Option<bool>,
    pub content: Option<Vec<u8>>,
    pub reason: Option<String>,
}

impl TransportResponse {
    /// A successful exchange carrying `content`.
    pub fn ok(content: impl Into<Vec<u8>>) -> Self {
        Self {
            success: Some(true),
            content: Some(content.into()),
            reason: None,
        }
    }

    /// A failed exchange with a human-readable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            content: None,
            reason: Some(reason.into()),
        }
    }

    /// Builds a response from an untyped record such as
    /// `{"success": true, "content": "..."}`.
    ///
    /// `success` follows loose truthiness: `0`, `""` and `"0"` are false.
    /// A `null` field counts as absent.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut record) = value else {
            return Err(MetaCpanError::Protocol(
                "response must be a structured record".into(),
            ));
        };

        let success = record.get("success").and_then(truthiness);
        let content = record.remove("content").and_then(|content| {
            match content {
                Value::Null => None,
                Value::String(text) => Some(text.into_bytes()),
                other => Some(other.to_string().into_bytes()),
            }
        });
        let reason = record.remove("reason").and_then(|reason| {
            match reason {
                Value::Null => None,
                Value::String(text) => Some(text),
                other => Some(other.to_string()),
            }
        });

        Ok(Self {
            success,
            content,
            reason,
        })
    }
}

fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => Some(!s.is_empty() && s != "0"),
        Value::Array(_) | Value::Object(_) => Some(true),
    }
}

/// Validates a transport response and parses its content as JSON.
///
/// Checks run in order and the first failure wins:
///
/// 1. `success` must be present ([`MetaCpanError::Protocol`])
/// 2. `success` must be true ([`MetaCpanError::RequestFailed`] with `url`
///    and the transport's reason)
/// 3. `content` must be present and non-empty ([`MetaCpanError::Protocol`])
/// 4. `content` must be valid JSON ([`MetaCpanError::Decode`])
pub fn decode(response: TransportResponse, url: &str) -> Result<Value> {
    let success = response
        .success
        .ok_or_else(|| MetaCpanError::Protocol("missing success indicator".into()))?;

    if !success {
        return Err(MetaCpanError::RequestFailed {
            url: url.to_string(),
            reason: response.reason,
        });
    }

    let content = response
        .content
        .filter(|content| !content.is_empty())
        .ok_or_else(|| MetaCpanError::Protocol("missing content".into()))?;

    serde_json::from_slice(&content).map_err(|source| {
        MetaCpanError::Decode {
            source,
            content: String::from_utf8_lossy(&content).into_owned(),
        }
    })
}

/// Like [`decode`], for an untyped response record.
pub fn decode_value(response: Value, url: &str) -> Result<Value> {
    decode(TransportResponse::from_value(response)?, url)
}

/// Decodes a response straight into a typed document.
pub fn decode_as<T: DeserializeOwned>(response: TransportResponse, url: &str) -> Result<T> {
    from_document(decode(response, url)?)
}

/// Interprets an already-decoded document as `T`.
///
/// A document that does not fit `T` is reported as [`MetaCpanError::Decode`].
pub fn from_document<T: DeserializeOwned>(document: Value) -> Result<T> {
    <T as Deserialize>::deserialize(&document).map_err(|source| {
        MetaCpanError::Decode {
            source,
            content: document.to_string(),
        }
    })
}

/// Serializes a request body.
pub(crate) fn encode_body<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|err| {
        MetaCpanError::InvalidArgument(format!("request body is not serializable: {err}"))
    })
}
