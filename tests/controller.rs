use std::time::Duration;

use tokio::time::sleep;

use crm_client::domain::types::{PageSize, RecordId};
use crm_client::services::{ActionOutcome, RecordListController, ReloadOutcome};

mod common;

use common::{FakeBackend, sample_record};

const DEBOUNCE: Duration = Duration::from_millis(350);

fn controller(backend: FakeBackend) -> RecordListController<FakeBackend> {
    RecordListController::new(backend, PageSize::DEFAULT, DEBOUNCE)
}

#[tokio::test(start_paused = true)]
async fn fast_response_never_raises_loading() {
    let backend = FakeBackend::new(vec![sample_record(1)]).with_latency(Duration::from_millis(100));
    let controller = controller(backend);

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.reload().await }
    });

    sleep(Duration::from_millis(50)).await;
    let state = controller.state();
    assert!(state.busy);
    assert!(!state.loading);

    assert_eq!(task.await.unwrap(), ReloadOutcome::Applied);
    sleep(Duration::from_millis(500)).await;

    let state = controller.state();
    assert!(!state.busy);
    assert!(!state.loading);
    assert_eq!(state.page.total_elements, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_response_raises_loading_until_it_lands() {
    let backend = FakeBackend::new(vec![sample_record(1)]).with_latency(Duration::from_millis(1000));
    let controller = controller(backend);

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.reload().await }
    });

    sleep(Duration::from_millis(200)).await;
    assert!(!controller.state().loading);

    sleep(Duration::from_millis(200)).await;
    let state = controller.state();
    assert!(state.busy);
    assert!(state.loading);

    assert_eq!(task.await.unwrap(), ReloadOutcome::Applied);
    let state = controller.state();
    assert!(!state.busy);
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn older_response_cannot_overwrite_newer_one() {
    let backend = FakeBackend::new(vec![sample_record(1), sample_record(2)]).with_latency_fn(
        |query| {
            if query.search_filter().is_none() {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(50)
            }
        },
    );
    let controller = controller(backend.clone());

    let unfiltered = tokio::spawn({
        let controller = controller.clone();
        async move { controller.reload().await }
    });
    sleep(Duration::from_millis(10)).await;

    assert_eq!(
        controller.set_search_term("person2").await,
        Some(ReloadOutcome::Applied)
    );
    assert_eq!(unfiltered.await.unwrap(), ReloadOutcome::Superseded);

    let state = controller.state();
    assert_eq!(state.query.search_term, "person2");
    assert_eq!(state.page.total_elements, 1);
    assert_eq!(state.page.content[0].id.map(RecordId::get), Some(2));
    assert!(!state.loading);
    assert_eq!(backend.fetches().len(), 2);
}

#[tokio::test]
async fn initial_load_asks_for_first_page_of_ten() {
    let backend = FakeBackend::new((1..=3).map(sample_record).collect());
    let controller = controller(backend.clone());

    assert_eq!(controller.reload().await, ReloadOutcome::Applied);

    let fetches = backend.fetches();
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].page_index, 0);
    assert_eq!(fetches[0].page_size.get(), 10);
    assert_eq!(fetches[0].search_filter(), None);

    let state = controller.state();
    assert_eq!(state.page.content.len(), 3);
    assert!(!state.page.has_next());
    assert!(!state.page.has_prev());
}

#[tokio::test]
async fn deleting_only_record_on_last_page() {
    let backend = FakeBackend::new((1..=21).map(sample_record).collect());
    let controller = controller(backend.clone());

    controller.reload().await;
    assert_eq!(controller.set_page(2).await, Some(ReloadOutcome::Applied));
    assert_eq!(controller.state().page.content.len(), 1);

    let last = RecordId::new(21).unwrap();
    controller.request_delete(last);
    assert_eq!(
        controller.confirm_delete().await,
        ActionOutcome::Completed(ReloadOutcome::Applied)
    );

    assert_eq!(backend.deletes(), vec![last]);
    assert_eq!(backend.fetches().len(), 3);

    let state = controller.state();
    assert_eq!(state.page.total_elements, 20);
    assert_eq!(state.page.total_pages, 2);
    assert_eq!(state.page.number, 1);
    assert_eq!(state.query.page_index, 1);
    assert_eq!(state.page.content.len(), 10);
    assert!(!state.page.has_next());
}

#[tokio::test]
async fn created_record_shows_up_after_reload() {
    let backend = FakeBackend::new(Vec::new());
    let controller = controller(backend.clone());
    controller.reload().await;

    let mut draft = controller.begin_create();
    draft.name = "Dana".to_string();
    draft.address = "Elm St".to_string();
    draft.email = "dana@example.com".to_string();
    draft.telephone = "555-0100".to_string();

    assert_eq!(
        controller.save(draft).await,
        ActionOutcome::Completed(ReloadOutcome::Applied)
    );

    let state = controller.state();
    assert_eq!(state.page.total_elements, 1);
    assert_eq!(state.page.content[0].name, "Dana");
    assert_eq!(state.draft, None);
}
