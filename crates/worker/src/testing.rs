//! Scripted ports for handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use sotd_core::cache::{CacheBackend, CacheKey, MemoryBackend, StoredResponse};
use sotd_core::{
    CacheRegistry, Error, Network, NotificationOptions, NotificationPort, Permission, Request, Response, WorkerConfig,
    WorkerScope,
};

use crate::context::{Ports, WorkerContext};

/// Network fake: routed URLs answer with a fixed status and body, everything
/// else is a `404`. Offline mode fails every fetch with a network error.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (StatusCode, Bytes)>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub fn route(&self, url: &str, status: StatusCode, body: &'static str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, Bytes::from_static(body.as_bytes())));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routed = self.routes.lock().unwrap().get(&url).cloned();
        Ok(match routed {
            Some((status, body)) => Response::new(status, HeaderMap::new(), body),
            None => Response::new(StatusCode::NOT_FOUND, HeaderMap::new(), "not found"),
        })
    }
}

pub struct RecordingNotifier {
    permission: Mutex<Permission>,
    answer: Mutex<Permission>,
    requests: Mutex<usize>,
    shown: Mutex<Vec<(String, NotificationOptions)>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self {
            permission: Mutex::new(Permission::Granted),
            answer: Mutex::new(Permission::Granted),
            requests: Mutex::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingNotifier {
    pub fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap() = permission;
    }

    /// What the user answers when asked.
    pub fn answer_request(&self, permission: Permission) {
        *self.answer.lock().unwrap() = permission;
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn query_permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        *self.requests.lock().unwrap() += 1;
        let answer = *self.answer.lock().unwrap();
        *self.permission.lock().unwrap() = answer;
        answer
    }

    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error> {
        self.shown.lock().unwrap().push((title.to_string(), options.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingScope {
    calls: Mutex<Vec<&'static str>>,
    fail_next: AtomicBool,
}

impl RecordingScope {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: &'static str) -> Result<(), Error> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Scope(format!("{call} rejected")));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl WorkerScope for RecordingScope {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.record("skip_waiting")
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.record("claim_clients")
    }
}

/// In-memory partitions with switchable faults: named partitions that
/// refuse to be created, lookups that error and stores that error.
#[derive(Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    refused: Mutex<HashSet<String>>,
    fail_lookups: AtomicBool,
    fail_stores: AtomicBool,
}

impl FailingBackend {
    pub fn refuse_partition(&self, name: &str) {
        self.refused.lock().unwrap().insert(name.to_string());
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fail_stores(&self) {
        self.fail_stores.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn create_partition(&self, name: &str) -> Result<(), Error> {
        if self.refused.lock().unwrap().contains(name) {
            return Err(Error::Cache("quota exceeded".into()));
        }
        self.inner.create_partition(name).await
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.inner.partitions().await
    }

    async fn lookup(
        &self, partition: &str, key: &CacheKey, ignore_search: bool,
    ) -> Result<Vec<StoredResponse>, Error> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Cache(format!("lookup in {partition} failed")));
        }
        self.inner.lookup(partition, key, ignore_search).await
    }

    async fn store(&self, partition: &str, key: &CacheKey, entry: StoredResponse) -> Result<(), Error> {
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(Error::Cache("quota exceeded".into()));
        }
        self.inner.store(partition, key, entry).await
    }
}

/// A worker context over in-memory partitions and recording ports, served
/// from `http://localhost:3000`.
pub struct Harness {
    pub ctx: WorkerContext,
    pub network: Arc<FakeNetwork>,
    pub notifier: Arc<RecordingNotifier>,
    pub scope: Arc<RecordingScope>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    pub fn with_config(config: WorkerConfig) -> Self {
        Self::with_backend(config, Arc::new(MemoryBackend::new()))
    }

    pub fn with_backend(config: WorkerConfig, backend: Arc<dyn CacheBackend>) -> Self {
        let network = Arc::new(FakeNetwork::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let scope = Arc::new(RecordingScope::default());

        let ports = Ports { network: network.clone(), notifier: notifier.clone(), scope: scope.clone() };
        let ctx = WorkerContext::new(&config, CacheRegistry::new(backend), ports).unwrap();

        Self { ctx, network, notifier, scope }
    }

    pub fn get(&self, path: &str) -> Request {
        Request::get(self.ctx.resolve(path).unwrap())
    }

    pub fn navigate(&self, path: &str) -> Request {
        Request::navigate(self.ctx.resolve(path).unwrap())
    }
}
