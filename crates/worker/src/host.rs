//! JSON-lines stdio transport.
//!
//! One event per input line, one outcome per output line:
//!
//! ```text
//! -> {"id":1,"event":"fetch","request":{"url":"/build/root.js"}}
//! <- {"id":1,"outcome":"response","status":200,"headers":{...},"body":"..."}
//! ```
//!
//! Events are dispatched concurrently, so outcomes may arrive out of order;
//! `id` is echoed back to correlate them. Notifications and scope calls made
//! by handlers are written as extra lines without an `id`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use sotd_core::{
    Error, NotificationOptions, NotificationPort, Permission, Request, RequestMode, Response, WorkerScope,
};

use crate::context::WorkerContext;
use crate::error::HostError;
use crate::handlers::navigation::SyncReport;
use crate::handlers::notification::Dispatch;
use crate::handlers::{EventOutcome, WorkerEvent};
use crate::worker::Worker;

pub type ReplySender = mpsc::UnboundedSender<Reply>;
pub type ReplyReceiver = mpsc::UnboundedReceiver<Reply>;

pub fn channel() -> (ReplySender, ReplyReceiver) {
    mpsc::unbounded_channel()
}

/// One input line.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub event: WireEvent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WireEvent {
    Install,
    Activate,
    Fetch { request: WireRequest },
    Message { data: Value },
    Push {
        #[serde(default)]
        data: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct WireRequest {
    /// Absolute, or relative to the worker origin.
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl WireRequest {
    pub fn into_request(self, ctx: &WorkerContext) -> Result<Request, Error> {
        let url = ctx.resolve(&self.url)?;
        let method =
            Method::from_bytes(self.method.as_bytes()).map_err(|e| Error::InvalidMessage(format!("method: {e}")))?;

        let mut request = Request::get(url).with_method(method).with_mode(self.mode);
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidMessage(format!("header name {name}: {e}")))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| Error::InvalidMessage(format!("header {name}: {e}")))?;
            request = request.with_header(name, value);
        }
        Ok(request)
    }
}

impl WireEvent {
    fn into_event(self, ctx: &WorkerContext) -> Result<WorkerEvent, Error> {
        Ok(match self {
            WireEvent::Install => WorkerEvent::Install,
            WireEvent::Activate => WorkerEvent::Activate,
            WireEvent::Fetch { request } => WorkerEvent::Fetch(request.into_request(ctx)?),
            WireEvent::Message { data } => WorkerEvent::Message(data),
            WireEvent::Push { data } => WorkerEvent::Push(data.map(Bytes::from)),
        })
    }
}

/// One output line.
#[derive(Debug, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub outcome: WireOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WireOutcome {
    Response { status: u16, headers: BTreeMap<String, String>, body: String },
    Synced { report: SyncReport },
    Notified { result: Dispatch },
    Completed,
    Failed { error: String },
    Unhandled,
    /// A notification shown by a handler.
    Notification { title: String, options: NotificationOptions },
    /// A lifecycle call on the worker scope.
    Scope { call: &'static str },
}

impl From<EventOutcome> for WireOutcome {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::Response(response) => response_outcome(response),
            EventOutcome::Synced(report) => WireOutcome::Synced { report },
            EventOutcome::Notified(result) => WireOutcome::Notified { result },
            EventOutcome::Completed => WireOutcome::Completed,
            EventOutcome::Failed(error) => WireOutcome::Failed { error: error.to_string() },
            EventOutcome::Unhandled => WireOutcome::Unhandled,
        }
    }
}

fn response_outcome(mut response: Response) -> WireOutcome {
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| (name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();
    let body = match response.bytes() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(error) => {
            tracing::warn!(%error, "response body unavailable");
            String::new()
        }
    };
    WireOutcome::Response { status: response.status().as_u16(), headers, body }
}

/// Notification port that writes each notification as an output line.
///
/// Permission starts undecided; asking grants it.
pub struct StdioNotifier {
    replies: ReplySender,
    permission: Mutex<Permission>,
}

impl StdioNotifier {
    pub fn new(replies: ReplySender) -> Self {
        Self { replies, permission: Mutex::new(Permission::Prompt) }
    }

    fn current(&self) -> Permission {
        self.permission.lock().map(|p| *p).unwrap_or(Permission::Unsupported)
    }
}

#[async_trait]
impl NotificationPort for StdioNotifier {
    async fn query_permission(&self) -> Permission {
        self.current()
    }

    async fn request_permission(&self) -> Permission {
        if let Ok(mut permission) = self.permission.lock() {
            if *permission == Permission::Prompt {
                *permission = Permission::Granted;
            }
        }
        self.current()
    }

    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error> {
        let outcome = WireOutcome::Notification { title: title.to_string(), options: options.clone() };
        self.replies
            .send(Reply { id: None, outcome })
            .map_err(|e| Error::NotificationFailed(e.to_string()))
    }
}

/// Worker scope that reports lifecycle calls as output lines.
pub struct StdioScope {
    replies: ReplySender,
}

impl StdioScope {
    pub fn new(replies: ReplySender) -> Self {
        Self { replies }
    }

    fn report(&self, call: &'static str) -> Result<(), Error> {
        self.replies
            .send(Reply { id: None, outcome: WireOutcome::Scope { call } })
            .map_err(|e| Error::Scope(e.to_string()))
    }
}

#[async_trait]
impl WorkerScope for StdioScope {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.report("skip_waiting")
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.report("claim_clients")
    }
}

/// Run the transport until input ends and every event has been answered.
///
/// Takes ownership of the worker and the sender so the output side sees the
/// channel close once the last event finishes.
pub async fn serve<R, W>(
    worker: Arc<Worker>, input: R, output: W, replies: ReplySender, inbox: ReplyReceiver,
) -> Result<W, HostError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer = tokio::spawn(write_outcomes(inbox, output));
    let read = read_events(input, worker, replies).await;
    let written = writer.await.map_err(|e| HostError::Worker(e.to_string()))?;
    read?;
    written
}

pub async fn read_events<R>(input: R, worker: Arc<Worker>, replies: ReplySender) -> Result<(), HostError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(%error, "unreadable event line");
                let outcome = WireOutcome::Failed { error: Error::InvalidMessage(error.to_string()).to_string() };
                send(&replies, Reply { id: None, outcome });
                continue;
            }
        };

        let id = envelope.id;
        let event = match envelope.event.into_event(worker.context()) {
            Ok(event) => event,
            Err(error) => {
                send(&replies, Reply { id, outcome: WireOutcome::Failed { error: error.to_string() } });
                continue;
            }
        };

        let worker = worker.clone();
        let replies = replies.clone();
        tasks.spawn(async move {
            let outcome = worker.dispatch(event).await;
            send(&replies, Reply { id, outcome: outcome.into() });
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined.map_err(|e| HostError::Worker(e.to_string()))?;
    }
    tracing::info!("input closed, all events answered");
    Ok(())
}

pub async fn write_outcomes<W>(mut inbox: ReplyReceiver, mut output: W) -> Result<W, HostError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = inbox.recv().await {
        let mut line = serde_json::to_vec(&reply)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    Ok(output)
}

fn send(replies: &ReplySender, reply: Reply) {
    if replies.send(reply).is_err() {
        tracing::warn!("output closed, dropping reply");
    }
}
