//! Shared fixtures for integration tests: an in-memory record backend for
//! controller tests and an HTTP server exposing the same data for repository
//! tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use async_trait::async_trait;

use crm_client::domain::page::PageSnapshot;
use crm_client::domain::query::QueryIntent;
use crm_client::domain::record::Record;
use crm_client::domain::types::RecordId;
use crm_client::repository::errors::{RepositoryError, RepositoryResult};
use crm_client::repository::{RecordReader, RecordWriter};

pub fn sample_record(n: i64) -> Record {
    Record::new(
        format!("Person {n}"),
        format!("{n} Main St"),
        format!("person{n}@example.com"),
        format!("555-{n:04}"),
    )
    .with_id(RecordId::new(n).expect("positive id"))
}

/// Server-side paging: filter, count, clamp the page number, slice.
pub fn page_of(records: &[Record], page: usize, size: usize, search: Option<&str>) -> PageSnapshot {
    let needle = search.map(str::to_lowercase);
    let matching: Vec<&Record> = records
        .iter()
        .filter(|r| match &needle {
            Some(needle) => {
                r.name.to_lowercase().contains(needle) || r.email.to_lowercase().contains(needle)
            }
            None => true,
        })
        .collect();

    let total_elements = matching.len();
    let total_pages = total_elements.div_ceil(size);
    let number = page.min(total_pages.saturating_sub(1));
    let content = matching
        .into_iter()
        .skip(number * size)
        .take(size)
        .cloned()
        .collect();

    PageSnapshot {
        content,
        total_pages,
        total_elements: total_elements as u64,
        number,
    }
}

type Latency = Arc<dyn Fn(&QueryIntent) -> Duration + Send + Sync>;

#[derive(Default)]
struct FakeState {
    records: Vec<Record>,
    fetches: Vec<QueryIntent>,
    deletes: Vec<RecordId>,
}

/// In-memory repository with configurable fetch latency.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    latency: Latency,
}

impl FakeBackend {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                records,
                ..FakeState::default()
            })),
            latency: Arc::new(|_| Duration::ZERO),
        }
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.with_latency_fn(move |_| latency)
    }

    pub fn with_latency_fn(
        mut self,
        latency: impl Fn(&QueryIntent) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.latency = Arc::new(latency);
        self
    }

    pub fn fetches(&self) -> Vec<QueryIntent> {
        self.state.lock().expect("lock poisoned").fetches.clone()
    }

    pub fn deletes(&self) -> Vec<RecordId> {
        self.state.lock().expect("lock poisoned").deletes.clone()
    }
}

#[async_trait]
impl RecordReader for FakeBackend {
    async fn fetch_page(&self, query: QueryIntent) -> RepositoryResult<PageSnapshot> {
        self.state
            .lock()
            .expect("lock poisoned")
            .fetches
            .push(query.clone());

        tokio::time::sleep((self.latency)(&query)).await;

        let state = self.state.lock().expect("lock poisoned");
        Ok(page_of(
            &state.records,
            query.page_index,
            query.page_size.get(),
            query.search_filter(),
        ))
    }
}

#[async_trait]
impl RecordWriter for FakeBackend {
    async fn save(&self, record: Record) -> RepositoryResult<Option<Record>> {
        let mut state = self.state.lock().expect("lock poisoned");
        let saved = match record.id {
            Some(id) => {
                let existing = state
                    .records
                    .iter_mut()
                    .find(|r| r.id == Some(id))
                    .ok_or_else(|| RepositoryError::http(404, None))?;
                *existing = record.clone();
                record
            }
            None => {
                let next = state
                    .records
                    .iter()
                    .filter_map(|r| r.id.map(RecordId::get))
                    .max()
                    .unwrap_or(0)
                    + 1;
                let record = record.with_id(RecordId::new(next).expect("positive id"));
                state.records.push(record.clone());
                record
            }
        };
        Ok(Some(saved))
    }

    async fn delete(&self, id: RecordId) -> RepositoryResult<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.deletes.push(id);
        let before = state.records.len();
        state.records.retain(|r| r.id != Some(id));
        if state.records.len() == before {
            return Err(RepositoryError::http(404, None));
        }
        Ok(())
    }
}

/// How the fake REST server answers a successful write.
#[derive(Clone, Copy, Debug, Default)]
pub enum WriteBody {
    /// The saved record as JSON.
    #[default]
    Json,
    /// No body at all, with the given success status.
    Empty(u16),
    /// A plain text body with status 200.
    Text(&'static str),
}

/// State behind the fake REST server.
#[derive(Default)]
pub struct RestState {
    pub records: Vec<Record>,
    /// Path accepting writes: `POST {path}` creates, `PUT {path}/{id}` updates.
    pub write_path: String,
    /// Status forced on requests to the write path.
    pub write_status: Option<u16>,
    /// Body of a successful write.
    pub write_body: WriteBody,
    /// Raw body served with 200 instead of the page JSON.
    pub page_body: Option<&'static str>,
    /// `METHOD path` of every request, in order.
    pub requests: Vec<String>,
    pub last_authorization: Option<String>,
}

pub type SharedRest = web::Data<Mutex<RestState>>;

pub struct FakeRestServer {
    pub addr: SocketAddr,
    pub state: SharedRest,
    handle: ServerHandle,
}

impl FakeRestServer {
    /// Starts the server on an ephemeral port. Must run inside an actix
    /// runtime (`#[actix_web::test]`).
    pub fn start(state: RestState) -> Self {
        let state: SharedRest = web::Data::new(Mutex::new(state));
        let data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle_request))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind test server");

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the record collection.
    pub fn api_base_url(&self) -> String {
        format!("http://{}/digg/user", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().expect("lock poisoned").requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().expect("lock poisoned").requests.clear();
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn handle_request(req: HttpRequest, body: web::Bytes, state: SharedRest) -> HttpResponse {
    let method = req.method().as_str().to_string();
    let path = req.path().to_string();

    let mut state = state.lock().expect("lock poisoned");
    state.requests.push(format!("{method} {path}"));
    state.last_authorization = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let segments: Vec<&str> = path
        .trim_start_matches("/digg/user")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if method == "GET" && path.starts_with("/digg/user/") {
        let page = segments.first().and_then(|s| s.parse::<usize>().ok());
        let size = segments.get(1).and_then(|s| s.parse::<usize>().ok());
        let search = match segments.get(2..) {
            Some(["search", term]) => Some(*term),
            Some([]) | None => None,
            Some(_) => return HttpResponse::NotFound().finish(),
        };
        if let Some(body) = state.page_body {
            return HttpResponse::Ok().content_type("text/plain").body(body);
        }
        return match (page, size) {
            (Some(page), Some(size)) if size > 0 => {
                HttpResponse::Ok().json(page_of(&state.records, page, size, search))
            }
            _ => HttpResponse::BadRequest().body("bad page request"),
        };
    }

    if method == "DELETE" && segments.len() == 1 {
        let Ok(id) = segments[0].parse::<RecordId>() else {
            return HttpResponse::BadRequest().finish();
        };
        let before = state.records.len();
        state.records.retain(|r| r.id != Some(id));
        return if state.records.len() == before {
            HttpResponse::NotFound().body(format!("User {id} not found"))
        } else {
            HttpResponse::Ok().finish()
        };
    }

    let write_path = state.write_path.clone();
    let create = method == "POST" && path == write_path;
    let update_id = if method == "PUT" {
        path.strip_prefix(&format!("{write_path}/"))
            .and_then(|id| id.parse::<RecordId>().ok())
    } else {
        None
    };
    if !create && update_id.is_none() {
        return HttpResponse::NotFound().finish();
    }

    if let Some(status) = state.write_status {
        let status = actix_web::http::StatusCode::from_u16(status).expect("valid status");
        return HttpResponse::build(status).body("Email should be valid");
    }

    let Ok(mut record) = serde_json::from_slice::<Record>(&body) else {
        return HttpResponse::BadRequest().body("malformed record");
    };

    match update_id {
        Some(id) => {
            record.id = Some(id);
            match state.records.iter_mut().find(|r| r.id == Some(id)) {
                Some(existing) => *existing = record.clone(),
                None => return HttpResponse::NotFound().finish(),
            }
        }
        None => {
            let next = state
                .records
                .iter()
                .filter_map(|r| r.id.map(RecordId::get))
                .max()
                .unwrap_or(0)
                + 1;
            record.id = Some(RecordId::new(next).expect("positive id"));
            state.records.push(record.clone());
        }
    }
    match state.write_body {
        WriteBody::Json => HttpResponse::Ok().json(record),
        WriteBody::Empty(status) => {
            let status = actix_web::http::StatusCode::from_u16(status).expect("valid status");
            HttpResponse::build(status).finish()
        }
        WriteBody::Text(text) => HttpResponse::Ok().content_type("text/plain").body(text),
    }
}
