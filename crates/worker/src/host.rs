//! Line-delimited JSON event loop.
//!
//! Each stdin line is one event, tagged by `event`; each stdout line is the
//! reply. A reply is `{"ok": true, "event": ..., ...}` on success or
//! `{"ok": false, "error": ..., "offline": bool}` on failure. A bad line
//! gets an error reply and the loop carries on until EOF.
//!
//! Fetch, sync and push events run concurrently, so replies can arrive out
//! of order; an `id` on the event is echoed in its reply for matching.
//! Install, activate and queue_submission are handled in arrival order:
//! the next line is not read until they finish.

use std::sync::Arc;

use folio_client::{Network, resolve};
use folio_core::{CachedResponse, ContactSubmission, Request, RequestMode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::WorkerError;
use crate::events::{FetchDisposition, PassReason};
use crate::handler::OfflineWorker;

/// An event sent by the host runtime.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Install,
    Activate,
    Fetch {
        #[serde(default = "default_method")]
        method: String,
        url: String,
        #[serde(default)]
        mode: RequestMode,
        #[serde(default)]
        headers: Vec<(String, String)>,
        #[serde(default)]
        body: Option<String>,
    },
    Sync {
        tag: String,
    },
    Push {
        #[serde(default)]
        data: Option<Value>,
    },
    NotificationClick {
        #[serde(default)]
        action: Option<String>,
    },
    QueueSubmission {
        submission: ContactSubmission,
    },
}

fn default_method() -> String {
    "GET".into()
}

impl HostEvent {
    fn name(&self) -> &'static str {
        match self {
            HostEvent::Install => "install",
            HostEvent::Activate => "activate",
            HostEvent::Fetch { .. } => "fetch",
            HostEvent::Sync { .. } => "sync",
            HostEvent::Push { .. } => "push",
            HostEvent::NotificationClick { .. } => "notification_click",
            HostEvent::QueueSubmission { .. } => "queue_submission",
        }
    }

    /// Events that change lifecycle or queue state run one at a time.
    fn is_ordered(&self) -> bool {
        matches!(self, HostEvent::Install | HostEvent::Activate | HostEvent::QueueSubmission { .. })
    }
}

/// Who answered a fetch.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum FetchSource {
    Worker,
    Network,
}

/// A response as written on the wire. UTF-8 bodies are sent as text,
/// anything else as a byte array.
#[derive(Debug, Serialize)]
struct ResponseReply<'a> {
    status: u16,
    status_text: &'a str,
    headers: &'a [(String, String)],
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_bytes: Option<&'a [u8]>,
}

impl<'a> From<&'a CachedResponse> for ResponseReply<'a> {
    fn from(response: &'a CachedResponse) -> Self {
        let text = std::str::from_utf8(&response.body).ok();
        Self {
            status: response.status,
            status_text: &response.status_text,
            headers: &response.headers,
            body: text,
            body_bytes: if text.is_some() { None } else { Some(&response.body) },
        }
    }
}

/// Serve events from `reader`, writing one reply line per event to `writer`.
///
/// Returns when `reader` reaches EOF and every event has been answered.
pub async fn run<N, R, W>(worker: Arc<OfflineWorker<N>>, reader: R, mut writer: W) -> std::io::Result<()>
where
    N: Network + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (replies, mut outbox) = mpsc::unbounded_channel::<Value>();

    let read = async move {
        let mut in_flight = JoinSet::new();
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let (id, event) = parse_line(&line);
            match event {
                Ok(event) if !event.is_ordered() => {
                    let worker = Arc::clone(&worker);
                    let replies = replies.clone();
                    in_flight.spawn(async move {
                        let _ = replies.send(handle_event(&worker, id, event).await);
                    });
                }
                Ok(event) => {
                    let _ = replies.send(handle_event(&worker, id, event).await);
                }
                Err(e) => {
                    let _ = replies.send(with_id(error_reply(None, &e), id));
                }
            }
            while let Some(done) = in_flight.try_join_next() {
                log_task_failure(done);
            }
        }
        while let Some(done) = in_flight.join_next().await {
            log_task_failure(done);
        }
        tracing::info!("host closed input");
        Ok::<_, std::io::Error>(())
    };

    let write = async move {
        while let Some(reply) = outbox.recv().await {
            let mut out = serde_json::to_vec(&reply)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    };

    tokio::try_join!(read, write)?;
    Ok(())
}

fn log_task_failure(done: Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        tracing::warn!(error = %e, "event task failed");
    }
}

/// Split a line into its correlation id and event.
fn parse_line(line: &str) -> (Option<Value>, Result<HostEvent, WorkerError>) {
    let mut value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return (None, Err(WorkerError::InvalidEvent(e.to_string()))),
    };
    let id = value.as_object_mut().and_then(|fields| fields.remove("id"));
    let event = serde_json::from_value(value).map_err(|e| WorkerError::InvalidEvent(e.to_string()));
    (id, event)
}

async fn handle_event<N: Network>(worker: &OfflineWorker<N>, id: Option<Value>, event: HostEvent) -> Value {
    let name = event.name();
    let reply = match dispatch(worker, event).await {
        Ok(mut payload) => {
            payload["ok"] = json!(true);
            payload["event"] = json!(name);
            payload
        }
        Err(e) => {
            tracing::debug!(event = name, error = %e, "event failed");
            error_reply(Some(name), &e)
        }
    };
    with_id(reply, id)
}

fn with_id(mut reply: Value, id: Option<Value>) -> Value {
    if let Some(id) = id {
        reply["id"] = id;
    }
    reply
}

fn error_reply(event: Option<&str>, err: &WorkerError) -> Value {
    json!({ "ok": false, "event": event, "error": err.to_string(), "offline": err.is_offline() })
}

async fn dispatch<N: Network>(worker: &OfflineWorker<N>, event: HostEvent) -> Result<Value, WorkerError> {
    let payload = match event {
        HostEvent::Install => json!({ "report": worker.install().await? }),
        HostEvent::Activate => json!({ "report": worker.activate().await? }),
        HostEvent::Fetch { method, url, mode, headers, body } => {
            let url = resolve(worker.origin(), &url).map_err(|e| WorkerError::InvalidEvent(e.to_string()))?;
            let request = Request { method, url, mode, headers, body: body.map(String::into_bytes) };
            fetch_reply(worker, &request).await?
        }
        HostEvent::Sync { tag } => json!({ "report": worker.sync(&tag).await? }),
        HostEvent::Push { data } => {
            let bytes = match data {
                None | Some(Value::Null) => None,
                Some(Value::String(text)) => Some(text.into_bytes()),
                Some(value) => Some(serde_json::to_vec(&value).map_err(folio_core::Error::from)?),
            };
            json!({ "notification": worker.handle_push(bytes.as_deref())? })
        }
        HostEvent::NotificationClick { action } => {
            json!({ "client_action": worker.handle_notification_click(action.as_deref()) })
        }
        HostEvent::QueueSubmission { submission } => {
            json!({ "submission_id": worker.queue_submission(&submission).await? })
        }
    };
    Ok(payload)
}

/// Run a fetch event. Requests the worker passes through go straight to
/// the network, unmodified and without the worker's deadline.
async fn fetch_reply<N: Network>(worker: &OfflineWorker<N>, request: &Request) -> Result<Value, WorkerError> {
    let (source, pass_through, response): (FetchSource, Option<PassReason>, CachedResponse) =
        match worker.handle_fetch(request).await? {
            FetchDisposition::Respond(response) => (FetchSource::Worker, None, response),
            FetchDisposition::PassThrough(reason) => {
                (FetchSource::Network, Some(reason), worker.network().fetch(request).await?)
            }
        };
    Ok(json!({
        "source": source,
        "pass_through": pass_through,
        "response": ResponseReply::from(&response),
    }))
}
