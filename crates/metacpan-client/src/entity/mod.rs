//! Typed views over decoded MetaCPAN documents.
//!
//! Each entity is a plain struct with the fields the API is known to return.
//! Documents are handled leniently:
//!
//! - fields that are sometimes a string and sometimes a list become `Vec<String>`
//! - empty strings are normalised to `None`
//! - version numbers may arrive as JSON numbers or strings
//! - unknown fields are ignored

use std::fmt;

use serde::{
    de::{self, DeserializeOwned, Visitor},
    Deserialize, Deserializer,
};
use serde_json::Value;

use crate::{decode::from_document, error::Result};

mod author;
mod file;
mod release;
mod social;

pub use author::{Author, AuthorProfile};
pub use file::{File, ModuleInfo};
pub use release::{Dependency, Distribution, DownloadUrl, Release, River, TestSummary};
pub use social::{Favorite, Rating};

/// A document type that can be looked up and searched.
pub trait Entity: DeserializeOwned {
    /// Document type name on the backend, also the lookup path segment.
    const DOC_TYPE: &'static str;

    /// Builds the entity from a decoded document.
    fn from_document(document: Value) -> Result<Self> {
        from_document(document)
    }

    /// Builds the entity from a search hit, reading `_source` or, for
    /// field-restricted searches, `fields`.
    fn from_hit(mut hit: Value) -> Result<Self> {
        let document = match hit.as_object_mut() {
            Some(hit) => {
                hit.remove("_source")
                    .or_else(|| hit.remove("fields"))
                    .unwrap_or_else(|| Value::Object(std::mem::take(hit)))
            }
            None => hit,
        };
        Self::from_document(document)
    }
}

/// Internal enum for deserializing fields that may be one string or many.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values.into_iter().flatten().collect(),
        None => Vec::new(),
    };
    Ok(values.into_iter().filter(|v| !v.is_empty()).collect())
}

fn empty_is_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.is_empty()))
}

/// Accepts a string or a number and keeps its textual form.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, number, or null")
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok((!v.is_empty()).then(|| v.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Internal enum for deserializing boolean values that may be strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlexiBool {
    Bool(bool),
    Number(i64),
    String(String),
}

fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexiBool>::deserialize(deserializer)? {
        Some(FlexiBool::Bool(b)) => Ok(Some(b)),
        Some(FlexiBool::Number(n)) => Ok(Some(n != 0)),
        Some(FlexiBool::String(s)) => {
            match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                "" => Ok(None),
                _ => {
                    Err(de::Error::invalid_value(
                        de::Unexpected::Str(&s),
                        &"a valid boolean (true/false, yes/no, 1/0)",
                    ))
                }
            }
        }
        None => Ok(None),
    }
}
