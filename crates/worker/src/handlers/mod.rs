//! Event dispatch.
//!
//! Each event kind maps to one handler function in a [`HandlerTable`]. A
//! handler borrows the [`WorkerContext`] and returns a boxed future, so the
//! host can keep many events in flight at once.

use std::collections::HashMap;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use sotd_core::{Error, Request, Response};

use crate::context::WorkerContext;

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod navigation;
pub mod notification;

use navigation::SyncReport;
use notification::Dispatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
    Push,
}

/// An event delivered to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Page-to-worker message, still undecoded.
    Message(serde_json::Value),
    /// Raw push payload, if the push carried one.
    Push(Option<Bytes>),
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Message(_) => EventKind::Message,
            WorkerEvent::Push(_) => EventKind::Push,
        }
    }
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    /// The response handed back to the page for a fetch.
    Response(Response),
    /// A navigation message populated the caches.
    Synced(SyncReport),
    Notified(Dispatch),
    Completed,
    Failed(Error),
    /// No handler is registered for the event kind.
    Unhandled,
}

pub type Handler = for<'a> fn(&'a WorkerContext, WorkerEvent) -> BoxFuture<'a, EventOutcome>;

pub struct HandlerTable {
    handlers: HashMap<EventKind, Handler>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// The table wiring every event kind to its standard handler.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(EventKind::Install, on_install);
        table.register(EventKind::Activate, on_activate);
        table.register(EventKind::Fetch, on_fetch);
        table.register(EventKind::Message, on_message);
        table.register(EventKind::Push, on_push);
        table
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    pub async fn dispatch(&self, ctx: &WorkerContext, event: WorkerEvent) -> EventOutcome {
        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => handler(ctx, event).await,
            None => {
                tracing::debug!(?kind, "no handler registered");
                EventOutcome::Unhandled
            }
        }
    }
}

fn completed(result: Result<(), Error>) -> EventOutcome {
    match result {
        Ok(()) => EventOutcome::Completed,
        Err(error) => EventOutcome::Failed(error),
    }
}

fn on_install(ctx: &WorkerContext, _event: WorkerEvent) -> BoxFuture<'_, EventOutcome> {
    async move { completed(lifecycle::install(ctx).await) }.boxed()
}

fn on_activate(ctx: &WorkerContext, _event: WorkerEvent) -> BoxFuture<'_, EventOutcome> {
    async move { completed(lifecycle::activate(ctx).await) }.boxed()
}

fn on_fetch(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, EventOutcome> {
    async move {
        match event {
            WorkerEvent::Fetch(request) => EventOutcome::Response(fetch::respond_with(ctx, request).await),
            _ => EventOutcome::Unhandled,
        }
    }
    .boxed()
}

fn on_message(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, EventOutcome> {
    async move {
        let WorkerEvent::Message(data) = event else {
            return EventOutcome::Unhandled;
        };
        match message::handle_message(ctx, data).await {
            Ok(Some(report)) => EventOutcome::Synced(report),
            Ok(None) => EventOutcome::Completed,
            Err(error) => EventOutcome::Failed(error),
        }
    }
    .boxed()
}

fn on_push(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, EventOutcome> {
    async move {
        let WorkerEvent::Push(payload) = event else {
            return EventOutcome::Unhandled;
        };
        match notification::dispatch_push(ctx, payload.as_deref()).await {
            Ok(dispatch) => EventOutcome::Notified(dispatch),
            Err(error) => EventOutcome::Failed(error),
        }
    }
    .boxed()
}
