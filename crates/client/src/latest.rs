//! "Last request wins" fetching.
//!
//! Each new input aborts the task serving the previous one, and a generation
//! counter drops any result that still arrives late, so subscribers only ever
//! see the outcome of the most recent request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use bizdesk_resources::{Receipt, ReceiptFilter};

use crate::data_provider::{DataProvider, ResourceProvider};
use crate::error::{ApiError, ApiResult};
use crate::query::ListParams;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RequestState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            RequestState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

pub struct LatestRequest<T> {
    generation: Arc<AtomicU64>,
    current: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<RequestState<T>>>,
}

impl<T> std::fmt::Debug for LatestRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatestRequest")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T> LatestRequest<T> {
    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LatestRequest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> LatestRequest<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RequestState::Idle);
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            current: Mutex::new(None),
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run `fut` as the current request, superseding any request in flight.
    /// Returns the generation assigned to it.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start<F>(&self, fut: F) -> u64
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        // Held until the new handle is stored, so overlapping starts and
        // cancels take turns and no handle escapes the abort.
        let mut current = self.lock_current();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = current.take() {
            handle.abort();
        }
        publish(&self.state, &self.generation, generation, RequestState::Loading);

        let counter = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            let outcome = match fut.await {
                Ok(value) => RequestState::Ready(value),
                Err(err) => RequestState::Failed(err),
            };
            if !publish(&state, &counter, generation, outcome) {
                tracing::trace!(generation, "dropping superseded result");
            }
        });

        *current = Some(handle);
        generation
    }

    /// Abort whatever is in flight and go back to `Idle`.
    pub fn cancel(&self) {
        let mut current = self.lock_current();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = current.take() {
            handle.abort();
        }
        self.state.send_replace(RequestState::Idle);
    }

    /// Wait until the current request settles.
    pub async fn settled(&self) -> RequestState<T> {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl<T> Drop for LatestRequest<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_current().take() {
            handle.abort();
        }
    }
}

/// Write `next` unless `generation` has been superseded. The check runs under
/// the channel lock so a newer request cannot slip in between.
fn publish<T>(
    state: &watch::Sender<RequestState<T>>,
    counter: &AtomicU64,
    generation: u64,
    next: RequestState<T>,
) -> bool {
    state.send_if_modified(|current| {
        if counter.load(Ordering::SeqCst) != generation {
            return false;
        }
        *current = next;
        true
    })
}

/// Receipts of the order currently selected on a form; changing the order
/// number cancels the previous lookup.
pub struct ReceiptLookup {
    provider: Arc<dyn DataProvider>,
    request: LatestRequest<Vec<Receipt>>,
    order_number: Mutex<Option<String>>,
}

impl ReceiptLookup {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            request: LatestRequest::new(),
            order_number: Mutex::new(None),
        }
    }

    pub fn order_number(&self) -> Option<String> {
        self.order_number.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Point the lookup at `order_number`. Blank clears it; the same value
    /// again is a no-op.
    pub fn set_order_number(&self, order_number: &str) {
        let order_number = order_number.trim();
        {
            let mut current = self.order_number.lock().unwrap_or_else(|p| p.into_inner());
            if current.as_deref() == Some(order_number)
                || (current.is_none() && order_number.is_empty())
            {
                return;
            }
            *current = (!order_number.is_empty()).then(|| order_number.to_string());
        }

        if order_number.is_empty() {
            self.request.cancel();
            return;
        }

        let provider = Arc::clone(&self.provider);
        let params = ListParams::new().filter(&ReceiptFilter::for_order(order_number));
        tracing::debug!(order_number, "looking up receipts");
        self.request.start(async move {
            provider
                .list::<Receipt>(&params)
                .await
                .map(|page| page.data)
        });
    }

    pub fn state(&self) -> RequestState<Vec<Receipt>> {
        self.request.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<Vec<Receipt>>> {
        self.request.subscribe()
    }

    pub async fn settled(&self) -> RequestState<Vec<Receipt>> {
        self.request.settled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;

    use bizdesk_core::RecordId;

    use crate::data_provider::ListResult;
    use crate::fixture::FixtureProvider;

    #[tokio::test]
    async fn newer_request_wins_even_if_older_finishes_later() {
        let latest: LatestRequest<&'static str> = LatestRequest::new();

        let (slow_tx, slow_rx) = oneshot::channel::<()>();
        latest.start(async move {
            let _ = slow_rx.await;
            Ok("first")
        });
        let second = latest.start(async { Ok("second") });

        assert_eq!(latest.settled().await, RequestState::Ready("second"));
        assert_eq!(latest.generation(), second);

        // Whether or not the first task is gone yet, its result must not land.
        let _ = slow_tx.send(());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(latest.state(), RequestState::Ready("second"));
    }

    #[tokio::test]
    async fn errors_are_published() {
        let latest: LatestRequest<u32> = LatestRequest::new();
        latest.start(async { Err(ApiError::from_status(500, "boom")) });
        let state = latest.settled().await;
        assert_eq!(state.error().and_then(ApiError::status), Some(500));
    }

    #[tokio::test]
    async fn cancel_returns_to_idle() {
        let latest: LatestRequest<u32> = LatestRequest::new();
        latest.start(std::future::pending());
        assert!(latest.state().is_loading());
        latest.cancel();
        assert_eq!(latest.state(), RequestState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_starts_leave_only_the_last_request_running() {
        let latest = Arc::new(LatestRequest::<u32>::new());
        let alive = Arc::new(());

        let mut starters = Vec::new();
        for _ in 0..4 {
            let latest = Arc::clone(&latest);
            let alive = Arc::clone(&alive);
            starters.push(tokio::spawn(async move {
                for _ in 0..25 {
                    let guard = Arc::clone(&alive);
                    latest.start(async move {
                        let _guard = guard;
                        std::future::pending::<ApiResult<u32>>().await
                    });
                }
            }));
        }
        for starter in starters {
            starter.await.unwrap();
        }
        assert!(latest.state().is_loading());

        latest.start(async { Ok(7) });
        assert_eq!(latest.settled().await, RequestState::Ready(7));

        // every superseded task was aborted, so its future (and guard) is gone
        for _ in 0..100 {
            if Arc::strong_count(&alive) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(Arc::strong_count(&alive), 1);

        latest.cancel();
        assert_eq!(latest.state(), RequestState::Idle);
    }

    /// Receipts for any order number, except `stalled` which never answers.
    struct ReceiptsByOrder {
        stalled: &'static str,
        lookups: Mutex<Vec<String>>,
    }

    impl ReceiptsByOrder {
        fn new(stalled: &'static str) -> Arc<Self> {
            Arc::new(Self {
                stalled,
                lookups: Mutex::new(Vec::new()),
            })
        }

        fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataProvider for ReceiptsByOrder {
        async fn get_list(&self, resource: &str, params: &ListParams) -> ApiResult<ListResult<Value>> {
            assert_eq!(resource, "receipts");
            let order = params.filter.get("orderNumber").unwrap_or_default().to_string();
            self.lookups.lock().unwrap().push(order.clone());
            if order == self.stalled {
                std::future::pending::<()>().await;
            }
            let rows = vec![
                json!({"orderNumber": order, "date": "2024-05-01", "amount": 40}),
                json!({"orderNumber": order, "date": "2024-05-09", "amount": 60}),
            ];
            Ok(ListResult::new(rows, 2))
        }
        async fn get_one(&self, _: &str, _: &RecordId) -> ApiResult<Value> {
            unimplemented!()
        }
        async fn get_many(&self, _: &str, _: &[RecordId]) -> ApiResult<Vec<Value>> {
            unimplemented!()
        }
        async fn get_many_reference(
            &self,
            _: &str,
            _: &str,
            _: &RecordId,
            _: &ListParams,
        ) -> ApiResult<ListResult<Value>> {
            unimplemented!()
        }
        async fn create(&self, _: &str, _: &Value) -> ApiResult<Value> {
            unimplemented!()
        }
        async fn update(&self, _: &str, _: &RecordId, _: &Value) -> ApiResult<Value> {
            unimplemented!()
        }
        async fn update_many(&self, _: &str, _: &[RecordId], _: &Value) -> ApiResult<Vec<RecordId>> {
            unimplemented!()
        }
        async fn delete(&self, _: &str, _: &RecordId) -> ApiResult<Value> {
            unimplemented!()
        }
        async fn delete_many(&self, _: &str, _: &[RecordId]) -> ApiResult<Vec<RecordId>> {
            unimplemented!()
        }
        async fn custom_get(&self, _: &str, _: &[(String, String)]) -> ApiResult<Value> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn switching_order_number_shows_only_the_new_receipts() {
        let backend = ReceiptsByOrder::new("SO-1");
        let lookup = ReceiptLookup::new(backend.clone());

        lookup.set_order_number("SO-1");
        assert!(lookup.state().is_loading());
        lookup.set_order_number("SO-2");

        let receipts = lookup.settled().await.value().cloned().unwrap();
        assert_eq!(receipts.len(), 2);
        assert!(receipts.iter().all(|r| r.order_number.as_deref() == Some("SO-2")));
        assert_eq!(lookup.order_number().as_deref(), Some("SO-2"));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(lookup.state().value().map(Vec::len), Some(2));
        assert_eq!(backend.lookups().last().map(String::as_str), Some("SO-2"));
    }

    #[tokio::test]
    async fn blank_order_number_goes_back_to_idle() {
        let backend = ReceiptsByOrder::new("SO-1");
        let lookup = ReceiptLookup::new(backend.clone());

        lookup.set_order_number("SO-1");
        assert!(lookup.state().is_loading());
        lookup.set_order_number("   ");

        assert_eq!(lookup.state(), RequestState::Idle);
        assert_eq!(lookup.order_number(), None);
    }

    #[tokio::test]
    async fn same_order_number_is_not_fetched_again() {
        let receipts = [json!({"orderNumber": "SO-3", "date": "2024-05-01", "amount": 25})];
        let fixture = Arc::new(FixtureProvider::new().with_rows("receipts", &receipts));
        let lookup = ReceiptLookup::new(fixture.clone());

        lookup.set_order_number("SO-3");
        assert_eq!(lookup.settled().await.value().map(Vec::len), Some(1));
        lookup.set_order_number(" SO-3 ");
        assert_eq!(lookup.settled().await.value().map(Vec::len), Some(1));

        assert_eq!(fixture.calls(), vec!["list receipts"]);
    }
}
