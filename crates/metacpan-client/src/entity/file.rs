use serde::{Deserialize, Serialize};

use super::{empty_is_none, flexible_bool, string_or_number, Entity};

/// A file inside a release. Module lookups return the file that
/// documents or defines the module.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct File {
    #[serde(default, deserialize_with = "empty_is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub path: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub release: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub distribution: Option<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub documentation: Option<String>,

    #[serde(
        default,
        rename = "abstract",
        deserialize_with = "empty_is_none"
    )]
    pub abstract_: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub maturity: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub indexed: Option<bool>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub authorized: Option<bool>,

    #[serde(default)]
    pub module: Vec<ModuleInfo>,
}

/// A package declared by a file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleInfo {
    pub name: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub indexed: Option<bool>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub authorized: Option<bool>,
}

impl Entity for File {
    const DOC_TYPE: &'static str = "file";
}

impl File {
    /// The declared package called `name`, if this file declares it.
    pub fn module_named(&self, name: &str) -> Option<&ModuleInfo> {
        self.module.iter().find(|module| module.name == name)
    }
}
