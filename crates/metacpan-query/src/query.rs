//! The caller-facing query tree.
//!
//! A [`Query`] is either a combinator over other queries or a single
//! field match. Values are validated when the tree is built, so a `Query`
//! in hand is always structurally sound and compiling it cannot fail.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w").expect("unable to compile word character regex"));

/// Key for the logical AND combinator.
pub const ALL: &str = "all";

/// Key for the logical OR combinator.
pub const EITHER: &str = "either";

/// A nested search query.
///
/// The JSON form mirrors the tree one-to-one:
///
/// ```
/// use metacpan_query::Query;
/// use serde_json::json;
///
/// let query: Query = serde_json::from_value(json!({
///     "all": [{ "author": "ETHER" }, { "name": "Moo*" }]
/// }))
/// .unwrap();
///
/// assert_eq!(
///     query,
///     Query::all([
///         Query::field("author", "ETHER").unwrap(),
///         Query::field("name", "Moo*").unwrap(),
///     ])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Query {
    /// Every sub-query must match.
    All(Vec<Query>),
    /// At least one sub-query must match.
    Either(Vec<Query>),
    /// `field` must match `value`, with `*` and `?` acting as wildcards.
    Match { field: String, value: String },
}

/// How a leaf value is matched against its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Term,
    Wildcard,
}

impl MatchKind {
    /// Picks the match kind for a leaf value.
    pub fn of(value: &str) -> Self {
        if value.contains(['*', '?']) {
            Self::Wildcard
        } else {
            Self::Term
        }
    }

    /// Name of the backend query type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Wildcard => "wildcard",
        }
    }
}

impl Query {
    pub fn all<I: IntoIterator<Item = Query>>(queries: I) -> Self {
        Self::All(queries.into_iter().collect())
    }

    pub fn either<I: IntoIterator<Item = Query>>(queries: I) -> Self {
        Self::Either(queries.into_iter().collect())
    }

    /// Builds a field match, rejecting values with no word character and
    /// the combinator keys as field names.
    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let field = field.into();
        let value = value.into();
        if matches!(field.as_str(), ALL | EITHER) || !is_matchable(&value) {
            return Err(QueryError::wrong_argument_type());
        }

        Ok(Self::Match {
            field,
            value,
        })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// The match kind for a leaf, `None` for combinators.
    pub fn match_kind(&self) -> Option<MatchKind> {
        match self {
            Self::Match { value, .. } => Some(MatchKind::of(value)),
            _ => None,
        }
    }

    /// Converts the tree back to its JSON form.
    pub fn to_dsl(&self) -> Value {
        let (key, value) = match self {
            Self::All(children) => (ALL.to_string(), dsl_list(children)),
            Self::Either(children) => (EITHER.to_string(), dsl_list(children)),
            Self::Match { field, value } => (field.clone(), Value::String(value.clone())),
        };

        let mut node = Map::new();
        node.insert(key, value);
        Value::Object(node)
    }
}

fn dsl_list(children: &[Query]) -> Value {
    Value::Array(children.iter().map(Query::to_dsl).collect())
}

/// A leaf value must be a non-empty string with at least one word character.
fn is_matchable(value: &str) -> bool {
    WORD_RE.is_match(value)
}

/// Parses every element of a combinator, stopping at the first bad one.
fn parse_children(value: &Value) -> Result<Vec<Query>> {
    value
        .as_array()
        .ok_or_else(QueryError::wrong_combinator_type)?
        .iter()
        .map(Query::try_from)
        .collect()
}

impl TryFrom<&Value> for Query {
    type Error = QueryError;

    /// Validates a JSON node, checking the node itself before any of its
    /// children and children left to right.
    fn try_from(node: &Value) -> Result<Self> {
        let Value::Object(map) = node else {
            return Err(QueryError::wrong_argument_type());
        };

        let mut entries = map.iter();
        let (key, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return Err(QueryError::wrong_arity()),
        };

        match key.as_str() {
            ALL => Ok(Self::All(parse_children(value)?)),
            EITHER => Ok(Self::Either(parse_children(value)?)),
            field => {
                match value {
                    Value::String(value) => Self::field(field, value.as_str()),
                    _ => Err(QueryError::wrong_argument_type()),
                }
            }
        }
    }
}

impl TryFrom<Value> for Query {
    type Error = QueryError;

    fn try_from(node: Value) -> Result<Self> {
        Self::try_from(&node)
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Self {
        query.to_dsl()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_leaf() {
        let query = Query::try_from(&json!({ "name": "Moose" })).unwrap();
        assert_eq!(
            query,
            Query::Match {
                field: "name".into(),
                value: "Moose".into()
            }
        );
        assert!(query.is_leaf());
        assert_eq!(query.match_kind(), Some(MatchKind::Term));
    }

    #[test]
    fn test_parse_nested_combinators() {
        let query = Query::try_from(&json!({
            "either": [
                { "all": [{ "author": "ETHER" }, { "status": "latest" }] },
                { "name": "Moo?" }
            ]
        }))
        .unwrap();

        let Query::Either(children) = &query else {
            panic!("expected either, got {query:?}");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], Query::All(inner) if inner.len() == 2));
        assert_eq!(children[1].match_kind(), Some(MatchKind::Wildcard));
        assert_eq!(query.match_kind(), None);
    }

    #[test]
    fn test_empty_object_is_rejected() {
        assert_eq!(
            Query::try_from(&json!({})).unwrap_err(),
            QueryError::wrong_arity()
        );
    }

    #[test]
    fn test_multiple_keys_are_rejected() {
        assert_eq!(
            Query::try_from(&json!({ "a": "1", "b": "2" })).unwrap_err(),
            QueryError::wrong_arity()
        );
    }

    #[test]
    fn test_combinator_must_hold_a_list() {
        assert_eq!(
            Query::try_from(&json!({ "all": { "not": "an array" } })).unwrap_err(),
            QueryError::wrong_combinator_type()
        );
        assert_eq!(
            Query::try_from(&json!({ "either": "Moose" })).unwrap_err(),
            QueryError::wrong_combinator_type()
        );
    }

    #[test]
    fn test_leaf_value_must_be_a_word_string() {
        for bad in [json!({ "name": 1 }), json!({ "name": "" }), json!({ "name": "*" })] {
            assert_eq!(
                Query::try_from(&bad).unwrap_err(),
                QueryError::wrong_argument_type(),
                "{bad}"
            );
        }
        assert_eq!(
            Query::try_from(&json!({ "name": ["Moose"] })).unwrap_err(),
            QueryError::wrong_argument_type()
        );
    }

    #[test]
    fn test_non_object_node_is_rejected() {
        assert_eq!(
            Query::try_from(&json!({ "all": ["Moose"] })).unwrap_err(),
            QueryError::wrong_argument_type()
        );
    }

    #[test]
    fn test_first_violation_wins() {
        // The combinator's own shape is checked before its children, and
        // children are checked left to right.
        let err = Query::try_from(&json!({
            "all": [
                { "a": "1", "b": "2" },
                { "either": "oops" }
            ]
        }))
        .unwrap_err();
        assert_eq!(err, QueryError::wrong_arity());

        let err = Query::try_from(&json!({
            "all": [
                { "name": "ok" },
                { "either": "oops" },
                {}
            ]
        }))
        .unwrap_err();
        assert_eq!(err, QueryError::wrong_combinator_type());
    }

    #[test]
    fn test_field_constructor_validates() {
        assert!(Query::field("name", "Moose").is_ok());
        assert_eq!(
            Query::field("name", "").unwrap_err(),
            QueryError::wrong_argument_type()
        );
        assert_eq!(
            Query::field("name", "??").unwrap_err(),
            QueryError::wrong_argument_type()
        );
    }

    #[test]
    fn test_combinator_keys_are_not_field_names() {
        for key in [ALL, EITHER] {
            assert_eq!(
                Query::field(key, "Moose").unwrap_err(),
                QueryError::wrong_argument_type()
            );
        }
    }

    #[test]
    fn test_built_queries_survive_serde() {
        let query = Query::either([
            Query::field("name", "Moose").unwrap(),
            Query::all([
                Query::field("author", "ETHER").unwrap(),
                Query::field("all_fields", "Moo*").unwrap(),
            ]),
        ]);

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(serde_json::from_value::<Query>(value).unwrap(), query);
    }

    #[test]
    fn test_match_kind_detection() {
        assert_eq!(MatchKind::of("Moose"), MatchKind::Term);
        assert_eq!(MatchKind::of("Moo*"), MatchKind::Wildcard);
        assert_eq!(MatchKind::of("Mo?se"), MatchKind::Wildcard);
        assert_eq!(MatchKind::Term.as_str(), "term");
        assert_eq!(MatchKind::Wildcard.as_str(), "wildcard");
    }

    #[test]
    fn test_serde_uses_dsl_form() {
        let dsl = json!({ "all": [{ "author": "ETHER" }, { "either": [{ "name": "Moo" }] }] });
        let query: Query = serde_json::from_value(dsl.clone()).unwrap();
        assert_eq!(serde_json::to_value(&query).unwrap(), dsl);

        let err = serde_json::from_value::<Query>(json!({ "all": 3 })).unwrap_err();
        assert!(err.to_string().contains("wrong type for combinator"));
    }

    #[test]
    fn test_empty_combinator_is_allowed() {
        assert_eq!(
            Query::try_from(&json!({ "either": [] })).unwrap(),
            Query::Either(Vec::new())
        );
    }
}
