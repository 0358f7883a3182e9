//! REST implementation of the record repository.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};

use crate::domain::page::PageSnapshot;
use crate::domain::query::QueryIntent;
use crate::domain::record::Record;
use crate::domain::types::RecordId;
use crate::models::config::ClientConfig;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    EndpointStore, FileEndpointStore, RecordReader, RecordWriter, WriteKind,
};

/// Talks to the record collection at `api_base_url`.
///
/// Writes go through endpoint discovery: the cached endpoint for the write
/// kind, then the configured override, then the conventional candidates. The
/// first candidate answering with a success status is remembered in the
/// endpoint store.
#[derive(Clone)]
pub struct HttpRepository {
    http: reqwest::Client,
    base: Url,
    write_override: Option<Url>,
    candidates: Vec<Url>,
    auth_token: Option<String>,
    endpoints: Arc<dyn EndpointStore>,
}

impl HttpRepository {
    /// Builds the repository using a file-backed endpoint cache.
    pub fn from_config(config: &ClientConfig) -> RepositoryResult<Self> {
        let store = FileEndpointStore::open(&config.endpoint_cache_path);
        Self::new(config, Arc::new(store))
    }

    pub fn new(config: &ClientConfig, endpoints: Arc<dyn EndpointStore>) -> RepositoryResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RepositoryError::Unexpected(format!("failed to build http client: {e}")))?;

        let base = parse_url(&config.api_base_url)?;

        let write_override = config
            .write_endpoint_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_url)
            .transpose()?;

        let candidates = config
            .write_candidates
            .iter()
            .map(|suffix| {
                let segments: Vec<&str> = suffix.split('/').filter(|s| !s.is_empty()).collect();
                child_url(&base, &segments)
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Self {
            http,
            base,
            write_override,
            candidates,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
            endpoints,
        })
    }

    /// URL of the list endpoint for the given query intent.
    pub fn page_url(&self, query: &QueryIntent) -> RepositoryResult<Url> {
        let page = query.page_index.to_string();
        let size = query.page_size.to_string();
        match query.search_filter() {
            Some(term) => child_url(&self.base, &[&page, &size, "search", term]),
            None => child_url(&self.base, &[&page, &size]),
        }
    }

    /// Ordered, de-duplicated write candidates for `kind`, with a flag marking
    /// the cached one.
    async fn write_candidates(&self, kind: WriteKind) -> Vec<(Url, bool)> {
        let cached = match self.endpoints.get(kind).map(|raw| (Url::parse(&raw), raw)) {
            Some((Ok(url), _)) => Some(url),
            Some((Err(e), raw)) => {
                log::warn!("Dropping invalid cached {} endpoint {raw}: {e}", kind.as_str());
                self.endpoints.clear(kind).await;
                None
            }
            None => None,
        };

        let configured = self
            .write_override
            .iter()
            .chain(self.candidates.iter())
            .cloned()
            .map(|url| (url, false));

        let mut ordered: Vec<(Url, bool)> = Vec::new();
        for (url, is_cached) in cached.map(|url| (url, true)).into_iter().chain(configured) {
            if !ordered.iter().any(|(seen, _)| seen == &url) {
                ordered.push((url, is_cached));
            }
        }
        ordered
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RepositoryResult<Response> {
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            log::warn!("Backend rejected credentials for {}", response.url());
        }
        Ok(response)
    }
}

/// Statuses meaning "this route does not exist here", as opposed to a real
/// failure of an existing route.
fn is_not_supported(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    )
}

fn parse_url(raw: &str) -> RepositoryResult<Url> {
    Url::parse(raw).map_err(|e| RepositoryError::Unexpected(format!("invalid url {raw}: {e}")))
}

/// Appends path segments to `base`, percent-encoding each one.
fn child_url(base: &Url, segments: &[&str]) -> RepositoryResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RepositoryError::Unexpected(format!("{base} cannot be a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn error_from_response(response: Response) -> RepositoryError {
    let status = response.status().as_u16();
    let body = response.text().await.ok().filter(|b| !b.trim().is_empty());
    RepositoryError::http(status, body)
}

/// Reads an optional record body. Empty or undecodable bodies count as absent.
async fn optional_record(response: Response) -> Option<Record> {
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read save response body: {e}");
            return None;
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Record>(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Ignoring unparseable save response: {}", RepositoryError::from(e));
            None
        }
    }
}

#[async_trait]
impl RecordReader for HttpRepository {
    async fn fetch_page(&self, query: QueryIntent) -> RepositoryResult<PageSnapshot> {
        let url = self.page_url(&query)?;
        log::debug!("GET {url}");

        let response = self.send(self.request(Method::GET, url)).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let page = serde_json::from_str::<PageSnapshot>(&body)?;
        Ok(page)
    }
}

#[async_trait]
impl RecordWriter for HttpRepository {
    async fn save(&self, record: Record) -> RepositoryResult<Option<Record>> {
        let kind = WriteKind::of(&record);
        let (method, id_segment) = match record.id {
            None => (Method::POST, None),
            Some(id) => (Method::PUT, Some(id.to_string())),
        };

        let mut tried = Vec::new();
        for (candidate, is_cached) in self.write_candidates(kind).await {
            let url = match &id_segment {
                Some(id) => child_url(&candidate, &[id])?,
                None => candidate.clone(),
            };

            let request = self.request(method.clone(), url.clone()).json(&record);
            let response = match self.send(request).await {
                Ok(response) => response,
                Err(e) => {
                    if is_cached {
                        self.endpoints.clear(kind).await;
                    }
                    log::error!("{method} {url} failed: {e}");
                    return Err(e);
                }
            };

            let status = response.status();
            if status.is_success() {
                if !is_cached {
                    log::info!("Resolved {} endpoint: {candidate}", kind.as_str());
                    self.endpoints.set(kind, candidate.as_str()).await;
                }
                return Ok(optional_record(response).await);
            }

            if is_not_supported(status) {
                log::debug!("{method} {url} not supported ({status}), trying next candidate");
                if is_cached {
                    log::info!("Cached {} endpoint {candidate} stopped working", kind.as_str());
                    self.endpoints.clear(kind).await;
                }
                tried.push(format!("{method} {url}"));
                continue;
            }

            if is_cached && status.is_server_error() {
                log::info!("Cached {} endpoint {candidate} is failing ({status})", kind.as_str());
                self.endpoints.clear(kind).await;
            }
            let err = error_from_response(response).await;
            log::error!("{method} {url} failed: {err}");
            return Err(err);
        }

        Err(RepositoryError::NoEndpointAvailable { tried })
    }

    async fn delete(&self, id: RecordId) -> RepositoryResult<()> {
        let url = child_url(&self.base, &[&id.to_string()])?;
        log::debug!("DELETE {url}");

        let response = self.send(self.request(Method::DELETE, url)).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}
