//! The MetaCPAN client.

use std::sync::Arc;

use metacpan_query::{search_body, Query};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    config::Config,
    decode::{decode, encode_body, from_document},
    entity::{Author, Distribution, DownloadUrl, Entity, File, Release},
    error::{MetaCpanError, Result},
    result_set::ResultSet,
    scroll::{HttpSearchBackend, ScrollOptions, ScrollRequest, ScrollSession, SearchBackend},
    transport::{HttpTransport, UreqTransport},
};

/// Entry point for lookups and searches against one MetaCPAN deployment.
///
/// The client holds no per-request state and can be shared between threads.
///
/// # Examples
///
/// ```no_run
/// use metacpan_client::Client;
///
/// let client = Client::new()?;
/// let release = client.release("Moose")?;
/// println!("{} {}", release.name, release.version.unwrap_or_default());
/// # Ok::<(), metacpan_client::MetaCpanError>(())
/// ```
#[derive(Clone)]
pub struct Client {
    base_url: String,
    domain: String,
    version: String,
    transport: Arc<dyn HttpTransport>,
    backend: Arc<dyn SearchBackend>,
}

/// Builder for [`Client`]. Starts from [`Config::default`].
#[derive(Default)]
pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn HttpTransport>>,
    backend: Option<Arc<dyn SearchBackend>>,
}

impl From<Config> for ClientBuilder {
    fn from(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }
}

impl ClientBuilder {
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.config.domain = domain.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Request timeout in the compact notation, e.g. `30s`.
    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.config.timeout = Some(timeout.into());
        self
    }

    /// Replaces the default `ureq` transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default HTTP search backend.
    pub fn backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<Client> {
        let config = self.config;
        config.resolve()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(&config.transport_config()?)),
        };
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpSearchBackend::new(&config.domain, transport.clone())),
        };

        Ok(Client {
            base_url: config.base_url(),
            domain: config.domain,
            version: config.version,
            transport,
            backend,
        })
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// A client with the default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn from_config(config: Config) -> Result<Self> {
        ClientBuilder::from(config).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn url_for(&self, path: &str) -> Result<String> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(MetaCpanError::InvalidArgument(
                "request path must not be empty".into(),
            ));
        }
        Ok(format!("{}/{}", self.base_url, path))
    }

    /// Fetches `path` relative to the base URL and decodes the JSON reply.
    ///
    /// With no `params` this is a GET. Otherwise `params` is sent as the JSON
    /// body of a POST.
    pub fn fetch(&self, path: &str, params: &Map<String, Value>) -> Result<Value> {
        let url = self.url_for(path)?;

        let response = if params.is_empty() {
            debug!("GET {}", url);
            self.transport.get(&url)
        } else {
            debug!("POST {}", url);
            self.transport.post(&url, encode_body(params)?)
        };

        decode(response, &url)
    }

    /// [`fetch`](Self::fetch) without parameters.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.fetch(path, &Map::new())
    }

    /// [`fetch`](Self::fetch) into a typed document.
    pub fn fetch_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Map<String, Value>,
    ) -> Result<T> {
        from_document(self.fetch(path, params)?)
    }

    /// Looks up `id` under the entity's own document type.
    pub fn lookup<E: Entity>(&self, id: &str) -> Result<E> {
        self.fetch_entity(E::DOC_TYPE, id)
    }

    fn fetch_entity<E: Entity>(&self, endpoint: &str, id: &str) -> Result<E> {
        let id = id.trim_matches('/');
        if id.is_empty() {
            return Err(MetaCpanError::InvalidArgument(format!(
                "{endpoint} identifier must not be empty"
            )));
        }
        E::from_document(self.get(&format!("{endpoint}/{id}"))?)
    }

    /// An author by PAUSE id.
    pub fn author(&self, pauseid: &str) -> Result<Author> {
        self.lookup(pauseid)
    }

    /// The latest release of a distribution, or a specific release when
    /// given `AUTHOR/Release-Name-1.0`.
    pub fn release(&self, name: &str) -> Result<Release> {
        self.lookup(name)
    }

    pub fn distribution(&self, name: &str) -> Result<Distribution> {
        self.lookup(name)
    }

    /// The file that provides `module` in its latest indexed release.
    pub fn module(&self, module: &str) -> Result<File> {
        self.fetch_entity("module", module)
    }

    /// A file by `AUTHOR/Release-1.0/path/in/archive`.
    pub fn file(&self, path: &str) -> Result<File> {
        self.lookup(path)
    }

    /// Download location of the release providing `module`.
    pub fn download_url(&self, module: &str) -> Result<DownloadUrl> {
        self.lookup(module)
    }

    /// Opens a scrolling search over `doc_type` for the given query
    /// document.
    ///
    /// The query is compiled before anything is sent, so a malformed query
    /// fails here with [`MetaCpanError::MalformedQuery`]. The session itself
    /// is lazy.
    pub fn ssearch(
        &self,
        doc_type: &str,
        query: &Value,
        options: ScrollOptions,
    ) -> Result<ScrollSession> {
        let body = search_body(query)?;
        self.open_scroll(doc_type, body, options)
    }

    /// Like [`ssearch`](Self::ssearch) for an already validated [`Query`].
    pub fn scroll(
        &self,
        doc_type: &str,
        query: &Query,
        options: ScrollOptions,
    ) -> Result<ScrollSession> {
        self.open_scroll(doc_type, query.to_search_body(), options)
    }

    /// Searches the entity's document type and yields typed results.
    pub fn search<E: Entity>(&self, query: &Value) -> Result<ResultSet<E>> {
        self.search_with(query, ScrollOptions::default())
    }

    pub fn search_with<E: Entity>(
        &self,
        query: &Value,
        options: ScrollOptions,
    ) -> Result<ResultSet<E>> {
        Ok(ResultSet::new(self.ssearch(E::DOC_TYPE, query, options)?))
    }

    fn open_scroll(
        &self,
        doc_type: &str,
        body: Value,
        options: ScrollOptions,
    ) -> Result<ScrollSession> {
        let request =
            ScrollRequest::new(self.version.as_str(), doc_type, body).with_options(options)?;
        debug!("prepared scroll over {}/{}", request.index, request.doc_type);
        Ok(ScrollSession::new(self.backend.clone(), request))
    }
}
