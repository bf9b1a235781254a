use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_is_none, Entity};

/// A user's "++" on a distribution.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Favorite {
    #[serde(default, deserialize_with = "empty_is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub user: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub release: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub distribution: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub date: Option<String>,
}

impl Entity for Favorite {
    const DOC_TYPE: &'static str = "favorite";
}

/// A CPAN Ratings review.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rating {
    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub user: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub release: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub distribution: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub date: Option<String>,

    #[serde(default)]
    pub details: Option<Value>,
}

impl Entity for Rating {
    const DOC_TYPE: &'static str = "rating";
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_favorite_and_rating() {
        let fav = Favorite::from_document(json!({
            "user": "abc123",
            "distribution": "Moose",
            "date": "2013-01-01T00:00:00"
        }))
        .unwrap();
        assert_eq!(fav.distribution.as_deref(), Some("Moose"));
        assert_eq!(fav.release, None);

        let rating = Rating::from_document(json!({
            "rating": 4.5,
            "distribution": "Moose",
            "details": { "documentation": "great" }
        }))
        .unwrap();
        assert_eq!(rating.rating, Some(4.5));
        assert_eq!(rating.details.unwrap()["documentation"], "great");
    }
}
