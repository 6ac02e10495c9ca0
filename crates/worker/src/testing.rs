//! Test doubles for the worker.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use folio_client::Network;
use folio_core::{AppConfig, CacheDb, CachedResponse, Error, Request};

use crate::handler::OfflineWorker;

/// In-process network with a connectivity switch and per-URL responses.
///
/// Unknown URLs answer 404. Every call is recorded as `"METHOD url"`.
pub struct ScriptedNetwork {
    online: AtomicBool,
    responses: Mutex<HashMap<String, CachedResponse>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    url_delays: Mutex<HashMap<String, Duration>>,
    max_bytes: Mutex<Option<usize>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            url_delays: Mutex::new(HashMap::new()),
            max_bytes: Mutex::new(None),
        }
    }

    pub fn respond(&self, url: &str, response: CachedResponse) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Delay responses for one URL only.
    pub fn set_delay_for(&self, url: &str, delay: Duration) {
        self.url_delays.lock().unwrap().insert(url.to_string(), delay);
    }

    /// Fail bodies larger than `max_bytes` the way the reqwest client does.
    pub fn set_max_bytes(&self, max_bytes: usize) {
        *self.max_bytes.lock().unwrap() = Some(max_bytes);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));

        // Resolved at call time, so a response swapped in mid-flight only
        // affects later calls.
        let response = self.responses.lock().unwrap().get(request.url.as_str()).cloned();
        let response = response.unwrap_or_else(|| CachedResponse::new(404, "not found"));

        let delay = self
            .url_delays
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .copied()
            .or(*self.delay.lock().unwrap());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url)));
        }

        let max_bytes = *self.max_bytes.lock().unwrap();
        if let Some(max_bytes) = max_bytes
            && response.body.len() > max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {max_bytes}", response.body.len())));
        }
        Ok(response)
    }
}

/// An HTML page response.
pub fn page(body: &str) -> CachedResponse {
    CachedResponse {
        status: 200,
        status_text: "OK".into(),
        headers: vec![("content-type".into(), "text/html; charset=utf-8".into())],
        body: body.as_bytes().to_vec(),
    }
}

/// A worker over in-memory storage whose network serves every static path.
pub async fn worker_with(config: AppConfig) -> OfflineWorker<ScriptedNetwork> {
    worker_on(config, CacheDb::open_in_memory().await.unwrap())
}

/// Like [`worker_with`], over the given storage.
pub fn worker_on(config: AppConfig, db: CacheDb) -> OfflineWorker<ScriptedNetwork> {
    let network = ScriptedNetwork::new();
    let origin = config.origin_url().unwrap();
    for path in &config.routes.static_paths {
        let url = origin.join(path).unwrap();
        network.respond(url.as_str(), page(&format!("page {path}")));
    }
    OfflineWorker::new(config, db, network).unwrap()
}

/// A worker that has completed install and activation.
pub async fn active_worker(config: AppConfig) -> OfflineWorker<ScriptedNetwork> {
    activated(worker_with(config).await).await
}

/// Run install and activation on `worker`.
pub async fn activated(worker: OfflineWorker<ScriptedNetwork>) -> OfflineWorker<ScriptedNetwork> {
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker.network().clear_calls();
    worker
}

/// Absolute URL on the default test origin.
pub fn url(path: &str) -> url::Url {
    url::Url::parse("http://localhost:3000").unwrap().join(path).unwrap()
}
