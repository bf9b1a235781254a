use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_is_none, flexible_bool, one_or_many, string_or_number, Entity};

/// An uploaded release of a distribution, e.g. `Moose-2.2206`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Release {
    pub name: String,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub distribution: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub archive: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub maturity: Option<String>,

    #[serde(
        default,
        rename = "abstract",
        deserialize_with = "empty_is_none"
    )]
    pub abstract_: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub download_url: Option<String>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub first: Option<bool>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub authorized: Option<bool>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub license: Vec<String>,

    #[serde(default)]
    pub dependency: Vec<Dependency>,

    #[serde(default)]
    pub tests: Option<TestSummary>,

    /// Free-form links (repository, bugtracker, homepage, ...).
    #[serde(default)]
    pub resources: Option<Value>,
}

/// A prerequisite declared by a release.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dependency {
    pub module: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub phase: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub relationship: Option<String>,
}

/// CPAN Testers counts for a release.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestSummary {
    #[serde(default)]
    pub pass: u64,
    #[serde(default)]
    pub fail: u64,
    #[serde(default)]
    pub na: u64,
    #[serde(default)]
    pub unknown: u64,
}

impl Entity for Release {
    const DOC_TYPE: &'static str = "release";
}

impl Release {
    pub fn is_latest(&self) -> bool {
        self.status.as_deref() == Some("latest")
    }

    /// Runtime `requires` prerequisites.
    pub fn runtime_requires(&self) -> impl Iterator<Item = &Dependency> {
        self.dependency.iter().filter(|dep| {
            dep.phase.as_deref() == Some("runtime")
                && dep.relationship.as_deref() == Some("requires")
        })
    }
}

/// A distribution, the name releases are grouped under.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Distribution {
    pub name: String,

    /// Bug tracker summary as reported by the API.
    #[serde(default)]
    pub bugs: Option<Value>,

    #[serde(default)]
    pub river: Option<River>,
}

/// How many other distributions depend on this one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct River {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub immediate: u64,
    #[serde(default)]
    pub bucket: u64,
}

impl Entity for Distribution {
    const DOC_TYPE: &'static str = "distribution";
}

/// Where to download the release that provides a module.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DownloadUrl {
    pub download_url: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub checksum_sha256: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub checksum_md5: Option<String>,
}

impl Entity for DownloadUrl {
    const DOC_TYPE: &'static str = "download_url";
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_release_from_document() {
        let release = Release::from_document(json!({
            "name": "Moose-2.2206",
            "distribution": "Moose",
            "version": "2.2206",
            "author": "ETHER",
            "status": "latest",
            "abstract": "",
            "license": "perl_5",
            "first": false,
            "tests": { "pass": 10, "fail": 1 },
            "dependency": [
                { "module": "Moo", "version": 0, "phase": "runtime", "relationship": "requires" },
                { "module": "Test::More", "phase": "test", "relationship": "requires" }
            ],
            "resources": { "repository": { "url": "https://github.com/moose/Moose" } }
        }))
        .unwrap();

        assert!(release.is_latest());
        assert_eq!(release.abstract_, None);
        assert_eq!(release.license, vec!["perl_5"]);
        assert_eq!(release.first, Some(false));
        assert_eq!(
            release.tests,
            Some(TestSummary {
                pass: 10,
                fail: 1,
                na: 0,
                unknown: 0
            })
        );

        let runtime: Vec<&str> = release.runtime_requires().map(|d| d.module.as_str()).collect();
        assert_eq!(runtime, vec!["Moo"]);
        assert_eq!(release.dependency[0].version.as_deref(), Some("0"));
    }

    #[test]
    fn test_distribution_from_document() {
        let dist = Distribution::from_document(json!({
            "name": "Moose",
            "river": { "total": 3000, "immediate": 400, "bucket": 5 }
        }))
        .unwrap();
        assert_eq!(dist.river.map(|r| r.immediate), Some(400));
        assert!(dist.bugs.is_none());
    }

    #[test]
    fn test_download_url_from_document() {
        let dl = DownloadUrl::from_document(json!({
            "download_url": "https://cpan.metacpan.org/authors/id/E/ET/ETHER/Moose-2.2206.tar.gz",
            "version": "2.2206",
            "status": "latest"
        }))
        .unwrap();
        assert!(dl.download_url.ends_with("Moose-2.2206.tar.gz"));
        assert_eq!(dl.checksum_sha256, None);
    }
}
