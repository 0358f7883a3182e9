//! List/pagination state controller.
//!
//! Owns the query intent and the page snapshot, and reconciles them with the
//! record repository. State lives in a [`watch`] channel so the presentation
//! layer can re-render on every change; it is only modified inside short
//! synchronous closures, never across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use validator::Validate;

use crate::domain::page::PageSnapshot;
use crate::domain::query::QueryIntent;
use crate::domain::record::Record;
use crate::domain::types::{PageSize, RecordId};
use crate::forms::record::{RecordForm, describe_errors};
use crate::models::config::ClientConfig;
use crate::notifications::{ChangeEvent, ChangeHandler};
use crate::repository::{RecordReader, RecordWriter};

/// Everything the presentation layer needs to render the list.
#[derive(Clone, Debug)]
pub struct ListState {
    pub query: QueryIntent,
    pub page: PageSnapshot,
    /// A reload is in flight.
    pub busy: bool,
    /// A reload has been in flight for longer than the debounce threshold.
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Record being added or edited.
    pub draft: Option<Record>,
    /// Record awaiting delete confirmation.
    pub pending_delete: Option<RecordId>,
    generation: u64,
}

impl ListState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            query: QueryIntent::new(page_size),
            page: PageSnapshot::default(),
            busy: false,
            loading: false,
            error: None,
            notice: None,
            draft: None,
            pending_delete: None,
            generation: 0,
        }
    }
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(PageSize::DEFAULT)
    }
}

/// Result of a reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The fresh snapshot replaced the previous one.
    Applied,
    /// The fetch failed; the previous snapshot is kept.
    Failed,
    /// A newer reload started before this one finished; its response was dropped.
    Superseded,
}

/// Result of a save or delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(ReloadOutcome),
    /// The record did not pass validation; nothing was sent.
    Invalid,
    Failed,
    /// `confirm_delete` was called without a pending request.
    NothingPending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    /// 1-based row number and reason for every rejected row.
    pub failed: Vec<(usize, String)>,
    pub reload: Option<ReloadOutcome>,
}

struct Inner<R> {
    repo: R,
    state: watch::Sender<ListState>,
    debounce: Duration,
}

pub struct RecordListController<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RecordListController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> RecordListController<R>
where
    R: RecordReader + RecordWriter + 'static,
{
    pub fn new(repo: R, page_size: PageSize, debounce: Duration) -> Self {
        let (state, _) = watch::channel(ListState::new(page_size));
        Self {
            inner: Arc::new(Inner {
                repo,
                state,
                debounce,
            }),
        }
    }

    pub fn from_config(repo: R, config: &ClientConfig) -> Self {
        Self::new(repo, config.page_size, config.loading_debounce())
    }

    /// Current state snapshot.
    pub fn state(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    /// Fetches the page described by the current query intent.
    pub async fn reload(&self) -> ReloadOutcome {
        let (generation, query) = self.begin_reload();

        let fetch = self.inner.repo.fetch_page(query);
        tokio::pin!(fetch);

        let result = tokio::select! {
            biased;
            result = &mut fetch => result,
            _ = tokio::time::sleep(self.inner.debounce) => {
                self.inner.state.send_if_modified(|s| {
                    if s.generation == generation && s.busy {
                        s.loading = true;
                        true
                    } else {
                        false
                    }
                });
                fetch.await
            }
        };

        if let Err(e) = &result {
            log::error!("Failed to load records: {e}");
        }

        let mut outcome = ReloadOutcome::Superseded;
        self.inner.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.busy = false;
            s.loading = false;
            match result {
                Ok(page) => {
                    s.query.page_index = page.number;
                    s.page = page;
                    s.error = None;
                    outcome = ReloadOutcome::Applied;
                }
                Err(e) => {
                    s.error = Some(format!("Could not load records: {e}"));
                    outcome = ReloadOutcome::Failed;
                }
            }
            true
        });

        if outcome == ReloadOutcome::Superseded {
            log::debug!("Dropped stale page response (generation {generation})");
        }
        outcome
    }

    fn begin_reload(&self) -> (u64, QueryIntent) {
        let mut started = (0, QueryIntent::default());
        self.inner.state.send_modify(|s| {
            s.generation += 1;
            s.busy = true;
            s.loading = false;
            started = (s.generation, s.query.clone());
        });
        started
    }

    /// Moves to page `index`. Outside `[0, totalPages - 1]` of the last
    /// snapshot, or when already there, nothing happens and `None` is returned.
    pub async fn set_page(&self, index: usize) -> Option<ReloadOutcome> {
        let changed = self.inner.state.send_if_modified(|s| {
            if !s.page.contains_page(index) || s.query.page_index == index {
                return false;
            }
            s.query.page_index = index;
            true
        });
        if changed { Some(self.reload().await) } else { None }
    }

    pub async fn next_page(&self) -> Option<ReloadOutcome> {
        let next = self.inner.state.borrow().query.page_index + 1;
        self.set_page(next).await
    }

    pub async fn prev_page(&self) -> Option<ReloadOutcome> {
        let current = self.inner.state.borrow().query.page_index;
        match current.checked_sub(1) {
            Some(prev) => self.set_page(prev).await,
            None => None,
        }
    }

    /// Changes the page size and goes back to the first page.
    pub async fn set_page_size(&self, size: PageSize) -> Option<ReloadOutcome> {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.query.page_size == size {
                return false;
            }
            s.query.page_size = size;
            s.query.page_index = 0;
            true
        });
        if changed { Some(self.reload().await) } else { None }
    }

    /// Changes the search term and goes back to the first page.
    pub async fn set_search_term(&self, term: impl Into<String>) -> Option<ReloadOutcome> {
        let term = term.into();
        let changed = self.inner.state.send_if_modified(|s| {
            if s.query.search_term == term {
                return false;
            }
            s.query.search_term = term;
            s.query.page_index = 0;
            true
        });
        if changed { Some(self.reload().await) } else { None }
    }

    /// Opens an empty draft for a new record.
    pub fn begin_create(&self) -> Record {
        let draft = Record::default();
        let copy = draft.clone();
        self.inner.state.send_modify(|s| s.draft = Some(draft));
        copy
    }

    /// Opens a draft copied from the record with `id` on the current page.
    pub fn begin_edit(&self, id: RecordId) -> Option<Record> {
        let mut found = None;
        self.inner.state.send_if_modified(|s| {
            found = s.page.content.iter().find(|r| r.id == Some(id)).cloned();
            s.draft = found.clone();
            true
        });
        found
    }

    pub fn discard_draft(&self) {
        self.inner.state.send_if_modified(|s| s.draft.take().is_some());
    }

    /// Validates and saves `record`, then reloads so the list shows what the
    /// server stored.
    pub async fn save(&self, record: Record) -> ActionOutcome {
        let form = RecordForm::from(&record);
        if let Err(errors) = form.validate() {
            let message = format!("Validation failed: {}", describe_errors(&errors));
            log::warn!("{message}");
            self.fail(message);
            return ActionOutcome::Invalid;
        }

        let record = Record::from(form);
        let creating = record.is_new();
        match self.inner.repo.save(record).await {
            Ok(saved) => {
                log::info!(
                    "Saved record {}",
                    saved
                        .and_then(|r| r.id)
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "(no body)".to_string())
                );
                let notice = if creating { "Record created" } else { "Record updated" };
                self.succeed(notice, |s| s.draft = None);
                ActionOutcome::Completed(self.reload().await)
            }
            Err(e) => {
                log::error!("Failed to save record: {e}");
                self.fail(format!("Could not save record: {e}"));
                ActionOutcome::Failed
            }
        }
    }

    /// Asks for confirmation before deleting `id`.
    pub fn request_delete(&self, id: RecordId) {
        self.inner.state.send_modify(|s| s.pending_delete = Some(id));
    }

    pub fn cancel_delete(&self) {
        self.inner
            .state
            .send_if_modified(|s| s.pending_delete.take().is_some());
    }

    /// Deletes the record awaiting confirmation, then reloads. The page
    /// number of the fresh snapshot is taken as is.
    pub async fn confirm_delete(&self) -> ActionOutcome {
        let mut pending = None;
        self.inner.state.send_if_modified(|s| {
            pending = s.pending_delete.take();
            pending.is_some()
        });
        let Some(id) = pending else {
            return ActionOutcome::NothingPending;
        };

        match self.inner.repo.delete(id).await {
            Ok(()) => {
                log::info!("Deleted record {id}");
                self.succeed("Record deleted", |_| {});
                ActionOutcome::Completed(self.reload().await)
            }
            Err(e) => {
                log::error!("Failed to delete record {id}: {e}");
                self.fail(format!("Could not delete record {id}: {e}"));
                ActionOutcome::Failed
            }
        }
    }

    /// Saves every valid form in order and reloads once at the end.
    pub async fn import_records(&self, forms: Vec<RecordForm>) -> ImportSummary {
        let mut created = 0;
        let mut failed = Vec::new();

        for (idx, form) in forms.into_iter().enumerate() {
            let row = idx + 1;
            if let Err(errors) = form.validate() {
                failed.push((row, describe_errors(&errors)));
                continue;
            }
            match self.inner.repo.save(Record::from(form)).await {
                Ok(_) => created += 1,
                Err(e) => {
                    log::error!("Failed to import row {row}: {e}");
                    failed.push((row, e.to_string()));
                }
            }
        }

        log::info!("Imported {created} records, {} rejected", failed.len());

        let rejected = (!failed.is_empty()).then(|| {
            let rows: Vec<String> = failed.iter().map(|(row, _)| row.to_string()).collect();
            format!("Rejected rows: {}", rows.join(", "))
        });
        let reload = if created > 0 {
            Some(self.reload().await)
        } else {
            None
        };

        // After the reload, whose success path clears `error`.
        self.inner.state.send_modify(|s| {
            s.notice = (created > 0).then(|| format!("Imported {created} records"));
            if rejected.is_some() || created == 0 {
                s.error = rejected;
            }
        });

        ImportSummary {
            created,
            failed,
            reload,
        }
    }

    pub fn dismiss_messages(&self) {
        self.inner.state.send_if_modified(|s| {
            let had = s.error.is_some() || s.notice.is_some();
            s.error = None;
            s.notice = None;
            had
        });
    }

    fn fail(&self, message: String) {
        self.inner.state.send_modify(|s| {
            s.error = Some(message);
            s.notice = None;
        });
    }

    fn succeed(&self, notice: &str, apply: impl FnOnce(&mut ListState)) {
        self.inner.state.send_modify(|s| {
            s.error = None;
            s.notice = Some(notice.to_string());
            apply(s);
        });
    }
}

#[async_trait]
impl<R> ChangeHandler for RecordListController<R>
where
    R: RecordReader + RecordWriter + 'static,
{
    async fn on_change(&self, event: ChangeEvent) {
        log::debug!("Reloading after change event {:?}", event.name);
        self.reload().await;
    }
}
