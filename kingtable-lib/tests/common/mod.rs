//! Shared helpers for the table integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use kingtable_lib::Row;
use kingtable_lib::error::TransportError;
use kingtable_lib::event::TableHooks;
use kingtable_lib::pagination::PaginationState;
use kingtable_lib::transport::FetchTransport;
use serde_json::Value;
use serde_json::json;
use tokio::sync::oneshot;

pub type Reply = Result<Value, TransportError>;

/// A transport whose answers are handed out by the test, in call order.
#[derive(Default)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<(String, Value)>>,
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a reply the test sends later; returns its sender.
    pub fn defer(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(rx);
        tx
    }

    /// Queues a reply that is ready immediately.
    pub fn reply(&self, reply: Reply) {
        let tx = self.defer();
        let _ = tx.send(reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> (String, Value) {
        self.requests.lock().unwrap()[index].clone()
    }

    /// Yields until `count` requests were posted.
    pub async fn wait_for_requests(&self, count: usize) {
        while self.request_count() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl FetchTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        let rx = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no reply scripted for this request");
        rx.await
            .unwrap_or_else(|_| Err(TransportError::parse("reply sender dropped")))
    }
}

/// Hooks that record which ones ran.
#[derive(Clone, Default)]
pub struct RecordingHooks {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingHooks {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: impl Into<String>) {
        self.calls.lock().unwrap().push(name.into());
    }
}

impl TableHooks for RecordingHooks {
    fn initialize(&self) {
        self.record("initialize");
    }

    fn on_fetch_start(&self) {
        self.record("fetch_start");
    }

    fn on_fetch_end(&self) {
        self.record("fetch_end");
    }

    fn on_fetch_error(&self, error: &TransportError) {
        self.record(format!("fetch_error:{}", error.reason()));
    }

    fn before_render(&self) {
        self.record("before_render");
    }

    fn after_render(&self) {
        self.record("after_render");
    }

    fn on_results_count_change(&self, pagination: &PaginationState) {
        self.record(format!("count:{}", pagination.total_rows_count));
    }
}

/// `count` rows shaped `{ id, name, city }`.
pub fn people(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let city = if i % 2 == 0 { "London" } else { "Paris" };
            serde_json::from_value(json!({
                "id": i + 1,
                "name": format!("Person {:03}", i + 1),
                "city": city,
            }))
            .unwrap()
        })
        .collect()
}

pub fn people_json(count: usize) -> Value {
    Value::Array(people(count).into_iter().map(Value::Object).collect())
}

pub fn envelope(rows: usize, total: usize) -> Value {
    json!({ "subset": people_json(rows), "total": total })
}
