use serde::{Deserialize, Serialize};

use super::{empty_is_none, one_or_many, Entity};

/// A CPAN author, keyed by PAUSE id.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Author {
    pub pauseid: String,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub asciiname: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub email: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub website: Vec<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub region: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub country: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub dir: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub gravatar_url: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub updated: Option<String>,

    #[serde(default)]
    pub profile: Vec<AuthorProfile>,
}

/// An account the author links from their profile.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorProfile {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl Entity for Author {
    const DOC_TYPE: &'static str = "author";
}

impl Author {
    /// The display name, falling back to the PAUSE id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.pauseid)
    }
}
