//! Scrolling search sessions.
//!
//! A [`ScrollSession`] walks the full result set of a search in pages,
//! holding the server-side cursor between calls. Nothing is fetched until the
//! first page is requested, and a session that is simply dropped sends nothing
//! further; the server expires the cursor after its lifetime.

use std::{
    collections::{BTreeMap, VecDeque},
    iter::FusedIterator,
    sync::Arc,
};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    decode::{decode, encode_body, from_document},
    error::{MetaCpanError, Result},
    time::parse_duration,
    transport::HttpTransport,
};

/// Number of hits requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// How long the server keeps the cursor alive between pages.
pub const DEFAULT_SCROLL_LIFETIME: &str = "5m";

/// Search-type hint sent with the opening request.
pub const DEFAULT_SEARCH_TYPE: &str = "scan";

/// Per-session overrides. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollOptions {
    pub size: Option<usize>,
    pub scroll: Option<String>,
    pub search_type: Option<String>,
    pub index: Option<String>,
    /// Extra backend-specific parameters for the opening request.
    pub params: BTreeMap<String, String>,
}

impl ScrollOptions {
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn scroll(mut self, lifetime: impl Into<String>) -> Self {
        self.scroll = Some(lifetime.into());
        self
    }

    pub fn search_type(mut self, search_type: impl Into<String>) -> Self {
        self.search_type = Some(search_type.into());
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Fully resolved parameters of a scroll session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRequest {
    pub index: String,
    pub doc_type: String,
    pub size: usize,
    pub scroll: String,
    pub search_type: String,
    pub params: BTreeMap<String, String>,
    /// The search body, `{"query": ...}`.
    pub body: Value,
}

impl ScrollRequest {
    pub fn new(index: impl Into<String>, doc_type: impl Into<String>, body: Value) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            size: DEFAULT_PAGE_SIZE,
            scroll: DEFAULT_SCROLL_LIFETIME.to_string(),
            search_type: DEFAULT_SEARCH_TYPE.to_string(),
            params: BTreeMap::new(),
            body,
        }
    }

    /// Applies `options` over the current values and validates the result.
    pub fn with_options(mut self, options: ScrollOptions) -> Result<Self> {
        if let Some(size) = options.size {
            self.size = size;
        }
        if let Some(scroll) = options.scroll {
            self.scroll = scroll;
        }
        if let Some(search_type) = options.search_type {
            self.search_type = search_type;
        }
        if let Some(index) = options.index {
            self.index = index;
        }
        self.params.extend(options.params);

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MetaCpanError::InvalidArgument(
                "scroll page size must be at least 1".into(),
            ));
        }
        if parse_duration(&self.scroll).is_none() {
            return Err(MetaCpanError::InvalidArgument(format!(
                "invalid scroll lifetime '{}'",
                self.scroll
            )));
        }
        if self.index.is_empty() || self.doc_type.is_empty() {
            return Err(MetaCpanError::InvalidArgument(
                "scroll index and document type must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// One page of scroll results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPage {
    pub scroll_id: Option<String>,
    pub total: Option<u64>,
    pub hits: Vec<Value>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    #[serde(default)]
    hits: RawHits,
}

#[derive(Deserialize, Default)]
struct RawHits {
    total: Option<RawTotal>,
    #[serde(default)]
    hits: Vec<Value>,
}

/// Older backends report a bare count, newer ones `{"value": n, ..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Count(u64),
    Object { value: u64 },
}

impl ScrollPage {
    /// Reads a search response of the form
    /// `{"_scroll_id": "..", "hits": {"total": n, "hits": [..]}}`.
    pub fn from_document(document: Value) -> Result<Self> {
        let raw: RawPage = from_document(document)?;
        let total = raw.hits.total.map(|total| {
            match total {
                RawTotal::Count(count) => count,
                RawTotal::Object { value } => value,
            }
        });

        Ok(Self {
            scroll_id: raw.scroll_id.filter(|id| !id.is_empty()),
            total,
            hits: raw.hits.hits,
        })
    }
}

/// The search-backend collaborator.
pub trait SearchBackend: Send + Sync {
    /// Runs the initial search and returns the first page with its cursor.
    fn open(&self, request: &ScrollRequest) -> Result<ScrollPage>;

    /// Fetches the page following `scroll_id`, renewing the cursor for
    /// `lifetime`.
    fn scroll(&self, scroll_id: &str, lifetime: &str) -> Result<ScrollPage>;
}

/// [`SearchBackend`] speaking the Elasticsearch HTTP scroll protocol through
/// an [`HttpTransport`].
#[derive(Clone)]
pub struct HttpSearchBackend {
    node: String,
    transport: Arc<dyn HttpTransport>,
}

impl HttpSearchBackend {
    /// A backend talking to `http://<domain>`.
    pub fn new(domain: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_node(format!("http://{domain}"), transport)
    }

    /// A backend talking to an explicit node URL.
    pub fn with_node(node: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let node = node.into().trim_end_matches('/').to_string();
        Self {
            node,
            transport,
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub(crate) fn search_url(&self, request: &ScrollRequest) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("scroll", &request.scroll);
        query.append_pair("size", &request.size.to_string());
        if !request.search_type.is_empty() {
            query.append_pair("search_type", &request.search_type);
        }
        for (key, value) in &request.params {
            query.append_pair(key, value);
        }

        format!(
            "{}/{}/{}/_search?{}",
            self.node,
            request.index,
            request.doc_type,
            query.finish()
        )
    }

    pub(crate) fn scroll_url(&self, lifetime: &str) -> String {
        let lifetime =
            url::form_urlencoded::byte_serialize(lifetime.as_bytes()).collect::<String>();
        format!("{}/_search/scroll?scroll={}", self.node, lifetime)
    }

    fn post(&self, url: &str, content: Vec<u8>) -> Result<ScrollPage> {
        let response = self.transport.post(url, content);
        ScrollPage::from_document(decode(response, url)?)
    }
}

impl SearchBackend for HttpSearchBackend {
    fn open(&self, request: &ScrollRequest) -> Result<ScrollPage> {
        let url = self.search_url(request);
        self.post(&url, encode_body(&request.body)?)
    }

    fn scroll(&self, scroll_id: &str, lifetime: &str) -> Result<ScrollPage> {
        let url = self.scroll_url(lifetime);
        self.post(&url, scroll_id.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// No request sent yet.
    Pending,
    Open,
    Exhausted,
    /// A page request failed; the session yields nothing more.
    Failed,
}

/// A lazy, resumable walk over every hit of a search.
///
/// Pages are pulled with [`next_page`](Self::next_page) or hits one at a
/// time through [`next_record`](Self::next_record) and the [`Iterator`]
/// impl. A session must not be driven from several threads at once.
pub struct ScrollSession {
    backend: Arc<dyn SearchBackend>,
    request: ScrollRequest,
    state: CursorState,
    scroll_id: Option<String>,
    total: Option<u64>,
    seen: u64,
    buffer: VecDeque<Value>,
}

impl ScrollSession {
    pub fn new(backend: Arc<dyn SearchBackend>, request: ScrollRequest) -> Self {
        Self {
            backend,
            request,
            state: CursorState::Pending,
            scroll_id: None,
            total: None,
            seen: 0,
            buffer: VecDeque::new(),
        }
    }

    pub fn request(&self) -> &ScrollRequest {
        &self.request
    }

    /// Total number of matching hits, once the server has reported it.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Number of hits received from the server so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Whether another record may be available.
    ///
    /// This is `false` only once the session knows it is done; a `true` can
    /// still be followed by an empty page.
    pub fn has_more(&self) -> bool {
        !self.buffer.is_empty() || matches!(self.state, CursorState::Pending | CursorState::Open)
    }

    /// Fetches the next page of hits, or `None` once the results are
    /// exhausted.
    ///
    /// Hits already buffered by [`next_record`](Self::next_record) are
    /// returned first. After an error the session is finished and yields
    /// `None`.
    pub fn next_page(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.buffer.is_empty() {
            return Ok(Some(self.buffer.drain(..).collect()));
        }

        loop {
            let opening = self.state == CursorState::Pending;
            let page = match self.state {
                CursorState::Exhausted | CursorState::Failed => return Ok(None),
                CursorState::Pending => {
                    debug!(
                        "opening scroll on {}/{} (size {}, lifetime {})",
                        self.request.index,
                        self.request.doc_type,
                        self.request.size,
                        self.request.scroll
                    );
                    self.backend.open(&self.request)
                }
                CursorState::Open => {
                    let Some(scroll_id) = self.scroll_id.as_deref() else {
                        self.state = CursorState::Exhausted;
                        return Ok(None);
                    };
                    self.backend.scroll(scroll_id, &self.request.scroll)
                }
            };

            let page = match page {
                Ok(page) => page,
                Err(err) => {
                    self.state = CursorState::Failed;
                    return Err(err);
                }
            };

            self.state = CursorState::Open;
            if page.scroll_id.is_some() {
                self.scroll_id = page.scroll_id;
            }
            if page.total.is_some() {
                self.total = page.total;
            }

            if page.hits.is_empty() {
                // A scan search answers the opening request with a cursor
                // and no hits.
                if opening && self.scroll_id.is_some() && self.total != Some(0) {
                    continue;
                }
                debug!("scroll exhausted after {} hits", self.seen);
                self.state = CursorState::Exhausted;
                return Ok(None);
            }

            self.seen += page.hits.len() as u64;
            debug!(
                "scroll page of {} hits ({} of {})",
                page.hits.len(),
                self.seen,
                self.total.map_or_else(|| "?".to_string(), |t| t.to_string())
            );

            if self.scroll_id.is_none() || self.total.is_some_and(|total| self.seen >= total) {
                self.state = CursorState::Exhausted;
            }

            return Ok(Some(page.hits));
        }
    }

    /// Returns the next hit, fetching a new page when the buffer runs dry.
    pub fn next_record(&mut self) -> Result<Option<Value>> {
        if self.buffer.is_empty() {
            match self.next_page()? {
                Some(hits) => self.buffer.extend(hits),
                None => return Ok(None),
            }
        }
        Ok(self.buffer.pop_front())
    }
}

impl Iterator for ScrollSession {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl FusedIterator for ScrollSession {}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::decode::TransportResponse;

    /// Serves `records` in pages, the way a scrolling server would.
    struct PagedBackend {
        records: Vec<Value>,
        scan: bool,
        calls: Mutex<Vec<String>>,
        fail_on_scroll: Option<usize>,
    }

    impl PagedBackend {
        fn new(count: usize) -> Self {
            Self {
                records: (0..count).map(|i| json!({ "_source": { "n": i } })).collect(),
                scan: false,
                calls: Mutex::new(Vec::new()),
                fail_on_scroll: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, offset: usize, size: usize) -> ScrollPage {
            let end = (offset + size).min(self.records.len());
            ScrollPage {
                scroll_id: Some(format!("{end}:{size}")),
                total: Some(self.records.len() as u64),
                hits: self.records[offset.min(end)..end].to_vec(),
            }
        }
    }

    impl SearchBackend for PagedBackend {
        fn open(&self, request: &ScrollRequest) -> Result<ScrollPage> {
            self.calls.lock().unwrap().push("open".into());
            if self.scan {
                return Ok(ScrollPage {
                    scroll_id: Some(format!("0:{}", request.size)),
                    total: Some(self.records.len() as u64),
                    hits: Vec::new(),
                });
            }
            Ok(self.page(0, request.size))
        }

        fn scroll(&self, scroll_id: &str, lifetime: &str) -> Result<ScrollPage> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("scroll {scroll_id} {lifetime}"));
            if self.fail_on_scroll == Some(calls.len() - 1) {
                return Err(MetaCpanError::RequestFailed {
                    url: "http://node/_search/scroll".into(),
                    reason: Some("cursor expired".into()),
                });
            }
            drop(calls);

            let (offset, size) = scroll_id.split_once(':').unwrap();
            Ok(self.page(offset.parse().unwrap(), size.parse().unwrap()))
        }
    }

    fn session(backend: Arc<PagedBackend>, size: usize) -> ScrollSession {
        let request = ScrollRequest::new("v0", "release", json!({ "query": {} }))
            .with_options(ScrollOptions::default().size(size))
            .unwrap();
        ScrollSession::new(backend, request)
    }

    #[test]
    fn test_pages_until_exhausted() {
        let backend = Arc::new(PagedBackend::new(5));
        let mut session = session(backend.clone(), 2);

        assert!(backend.calls().is_empty());
        assert!(session.has_more());

        let sizes: Vec<usize> = std::iter::from_fn(|| session.next_page().unwrap())
            .map(|page| page.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(!session.has_more());
        assert_eq!(session.total(), Some(5));
        assert_eq!(session.seen(), 5);

        assert_eq!(session.next_page().unwrap(), None);
        assert_eq!(
            backend.calls(),
            vec!["open", "scroll 2:2 5m", "scroll 4:2 5m"]
        );
    }

    #[test]
    fn test_records_in_order() {
        let backend = Arc::new(PagedBackend::new(5));
        let records: Vec<Value> = session(backend, 2).map(|r| r.unwrap()).collect();
        let ns: Vec<u64> = records
            .iter()
            .map(|r| r["_source"]["n"].as_u64().unwrap())
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_scan_priming_page_is_skipped() {
        let backend = Arc::new(PagedBackend {
            scan: true,
            ..PagedBackend::new(3)
        });
        let mut session = session(backend.clone(), 2);

        assert_eq!(session.next_page().unwrap().map(|p| p.len()), Some(2));
        assert_eq!(session.next_page().unwrap().map(|p| p.len()), Some(1));
        assert_eq!(session.next_page().unwrap(), None);
        assert_eq!(
            backend.calls(),
            vec!["open", "scroll 0:2 5m", "scroll 2:2 5m"]
        );
    }

    #[test]
    fn test_no_matches() {
        let backend = Arc::new(PagedBackend::new(0));
        let mut session = session(backend.clone(), 10);
        assert_eq!(session.next_page().unwrap(), None);
        assert!(!session.has_more());
        assert_eq!(session.total(), Some(0));
        assert_eq!(backend.calls(), vec!["open"]);
    }

    #[test]
    fn test_error_propagates_once() {
        let backend = Arc::new(PagedBackend {
            fail_on_scroll: Some(1),
            ..PagedBackend::new(5)
        });
        let mut session = session(backend, 2);

        let results: Vec<Result<Value>> = session.by_ref().collect();
        assert_eq!(results.len(), 3);
        assert!(results[..2].iter().all(|r| r.is_ok()));
        assert!(matches!(
            results[2],
            Err(MetaCpanError::RequestFailed { .. })
        ));
        assert!(!session.has_more());
        assert!(session.next().is_none());
    }

    #[test]
    fn test_next_page_drains_buffer_first() {
        let backend = Arc::new(PagedBackend::new(5));
        let mut session = session(backend, 3);

        assert!(session.next_record().unwrap().is_some());
        assert_eq!(session.next_page().unwrap().map(|p| p.len()), Some(2));
        assert_eq!(session.next_page().unwrap().map(|p| p.len()), Some(2));
        assert_eq!(session.next_page().unwrap(), None);
    }

    #[test]
    fn test_options_override_defaults() {
        let request = ScrollRequest::new("v0", "author", json!({}));
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
        assert_eq!(request.scroll, "5m");
        assert_eq!(request.search_type, "scan");

        let request = request
            .with_options(
                ScrollOptions::default()
                    .size(50)
                    .scroll("1m")
                    .search_type("query_then_fetch")
                    .index("v1")
                    .param("fields", "pauseid"),
            )
            .unwrap();
        assert_eq!(request.size, 50);
        assert_eq!(request.scroll, "1m");
        assert_eq!(request.search_type, "query_then_fetch");
        assert_eq!(request.index, "v1");
        assert_eq!(request.params.get("fields").map(String::as_str), Some("pauseid"));
    }

    #[test]
    fn test_invalid_options() {
        let request = ScrollRequest::new("v0", "author", json!({}));
        assert!(matches!(
            request.clone().with_options(ScrollOptions::default().size(0)),
            Err(MetaCpanError::InvalidArgument(_))
        ));
        assert!(matches!(
            request.with_options(ScrollOptions::default().scroll("soon")),
            Err(MetaCpanError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_page_from_document() {
        let page = ScrollPage::from_document(json!({
            "_scroll_id": "c2Nhbjs",
            "hits": { "total": 2, "hits": [{ "_id": "a" }, { "_id": "b" }] }
        }))
        .unwrap();
        assert_eq!(page.scroll_id.as_deref(), Some("c2Nhbjs"));
        assert_eq!(page.total, Some(2));
        assert_eq!(page.hits.len(), 2);

        let page = ScrollPage::from_document(json!({
            "_scroll_id": "",
            "hits": { "total": { "value": 7, "relation": "eq" } }
        }))
        .unwrap();
        assert_eq!(page.scroll_id, None);
        assert_eq!(page.total, Some(7));
        assert!(page.hits.is_empty());

        assert!(matches!(
            ScrollPage::from_document(json!({ "hits": "nope" })),
            Err(MetaCpanError::Decode { .. })
        ));
    }

    struct Recording {
        requests: Mutex<Vec<(String, String)>>,
        reply: String,
    }

    impl HttpTransport for Recording {
        fn get(&self, url: &str) -> TransportResponse {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), String::new()));
            TransportResponse::ok(self.reply.clone())
        }

        fn post(&self, url: &str, content: Vec<u8>) -> TransportResponse {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), String::from_utf8(content).unwrap()));
            TransportResponse::ok(self.reply.clone())
        }
    }

    #[test]
    fn test_http_backend_requests() {
        let transport = Arc::new(Recording {
            requests: Mutex::new(Vec::new()),
            reply: json!({ "_scroll_id": "abc", "hits": { "total": 1, "hits": [] } }).to_string(),
        });
        let backend = HttpSearchBackend::new("api.metacpan.org", transport.clone());
        assert_eq!(backend.node(), "http://api.metacpan.org");

        let body = json!({ "query": { "term": { "name": "Moo" } } });
        let request = ScrollRequest::new("v0", "release", body)
            .with_options(ScrollOptions::default().size(2).param("fields", "name"))
            .unwrap();

        let page = backend.open(&request).unwrap();
        assert_eq!(page.scroll_id.as_deref(), Some("abc"));
        backend.scroll("abc", "5m").unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(
            requests[0].0,
            "http://api.metacpan.org/v0/release/_search?scroll=5m&size=2&search_type=scan&fields=name"
        );
        assert_eq!(
            serde_json::from_str::<Value>(&requests[0].1).unwrap(),
            json!({ "query": { "term": { "name": "Moo" } } })
        );
        assert_eq!(requests[1].0, "http://api.metacpan.org/_search/scroll?scroll=5m");
        assert_eq!(requests[1].1, "abc");
    }

    #[test]
    fn test_http_backend_failure() {
        struct Down;
        impl HttpTransport for Down {
            fn get(&self, _: &str) -> TransportResponse {
                TransportResponse::failed("connection refused")
            }

            fn post(&self, _: &str, _: Vec<u8>) -> TransportResponse {
                TransportResponse::failed("connection refused")
            }
        }

        let backend = HttpSearchBackend::with_node("http://localhost:9200/", Arc::new(Down));
        let err = backend.scroll("abc", "5m").unwrap_err();
        match err {
            MetaCpanError::RequestFailed { url, reason } => {
                assert_eq!(url, "http://localhost:9200/_search/scroll?scroll=5m");
                assert_eq!(reason.as_deref(), Some("connection refused"));
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }
}
