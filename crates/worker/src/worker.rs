use crate::context::WorkerContext;
use crate::handlers::{EventOutcome, HandlerTable, WorkerEvent};

/// A worker instance: its context plus the table that routes events.
pub struct Worker {
    ctx: WorkerContext,
    table: HandlerTable,
}

impl Worker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self::with_table(ctx, HandlerTable::standard())
    }

    pub fn with_table(ctx: WorkerContext, table: HandlerTable) -> Self {
        Self { ctx, table }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    pub async fn dispatch(&self, event: WorkerEvent) -> EventOutcome {
        let kind = event.kind();
        tracing::debug!(?kind, "dispatching event");

        let outcome = self.table.dispatch(&self.ctx, event).await;
        if let EventOutcome::Failed(error) = &outcome {
            tracing::warn!(?kind, %error, "event handler failed");
        }
        outcome
    }
}
