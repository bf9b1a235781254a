use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;
use ureq::Proxy;
use url::Url;

use crate::{
    error::{ErrorContext, MetaCpanError, Result},
    time::parse_duration,
    transport::{default_user_agent, TransportConfig},
};

pub const DEFAULT_DOMAIN: &str = "api.metacpan.org";
pub const DEFAULT_VERSION: &str = "v0";

/// Client configuration.
///
/// Every field has a default, so an empty or partial `config.toml` is valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Host serving both the REST API and the search backend.
    /// Default: api.metacpan.org
    pub domain: String,

    /// API version segment, also used as the search index name.
    /// Default: v0
    pub version: String,

    /// Overrides the derived `http://<domain>/<version>` base URL.
    pub base_url: Option<String>,

    /// Agent string sent with every request.
    /// Default: metacpan-client/<version>
    pub user_agent: Option<String>,

    /// Global request timeout, e.g. `30s` or `1m`.
    pub timeout: Option<String>,

    /// Proxy URL for all requests.
    pub proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            version: DEFAULT_VERSION.to_string(),
            base_url: None,
            user_agent: None,
            timeout: None,
            proxy: None,
        }
    }
}

/// Location of the configuration file: `$METACPAN_CONFIG`, or
/// `$XDG_CONFIG_HOME/metacpan/config.toml`.
pub fn config_path() -> PathBuf {
    match env::var("METACPAN_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("metacpan").join("config.toml"),
    }
}

fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_default()
                .join(".config")
        })
}

impl Config {
    /// Loads the configuration from [`config_path`], applies environment
    /// overrides and validates the result.
    pub fn new() -> Result<Self> {
        Self::load(&config_path())
    }

    /// Like [`Config::new`] with an explicit file. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                return Err::<Self, _>(err)
                    .with_context(|| format!("reading config file {}", path.display()));
            }
        };

        config.apply_env();
        config.resolve()?;

        Ok(config)
    }

    /// Applies `METACPAN_DOMAIN`, `METACPAN_VERSION` and `METACPAN_BASE_URL`.
    pub fn apply_env(&mut self) {
        if let Ok(domain) = env::var("METACPAN_DOMAIN") {
            self.domain = domain;
        }
        if let Ok(version) = env::var("METACPAN_VERSION") {
            self.version = version;
        }
        if let Ok(base_url) = env::var("METACPAN_BASE_URL") {
            self.base_url = Some(base_url);
        }
    }

    /// Validates the configuration.
    pub fn resolve(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(MetaCpanError::Config("domain must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(MetaCpanError::Config("version must not be empty".into()));
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|err| {
                MetaCpanError::Config(format!("invalid base_url '{base_url}': {err}"))
            })?;
        }
        self.timeout()?;
        Ok(())
    }

    /// The REST API base URL.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim_end_matches('/').to_string(),
            None => format!("http://{}/{}", self.domain, self.version),
        }
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|timeout| {
                parse_duration(timeout)
                    .ok_or_else(|| MetaCpanError::Config(format!("invalid timeout '{timeout}'")))
            })
            .transpose()
    }

    /// Transport settings derived from this configuration.
    pub fn transport_config(&self) -> Result<TransportConfig> {
        let proxy = self
            .proxy
            .as_deref()
            .map(|proxy| {
                Proxy::new(proxy)
                    .map_err(|err| MetaCpanError::Config(format!("invalid proxy '{proxy}': {err}")))
            })
            .transpose()?;

        Ok(TransportConfig {
            user_agent: Some(
                self.user_agent
                    .clone()
                    .unwrap_or_else(default_user_agent),
            ),
            headers: None,
            proxy,
            timeout: self.timeout()?,
        })
    }
}
