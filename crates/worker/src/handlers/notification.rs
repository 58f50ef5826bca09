//! Push notifications.

use serde::Serialize;

use sotd_core::push::PushContent;
use sotd_core::{Error, Permission};

use crate::context::WorkerContext;

/// Result of a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "dispatch", content = "permission", rename_all = "snake_case")]
pub enum Dispatch {
    Shown,
    /// Nothing was shown; carries the permission that prevented it.
    Skipped(Permission),
}

pub async fn dispatch_push(ctx: &WorkerContext, payload: Option<&[u8]>) -> Result<Dispatch, Error> {
    let mut permission = ctx.notifier.query_permission().await;
    if permission == Permission::Prompt {
        permission = ctx.notifier.request_permission().await;
        tracing::debug!(?permission, "Notification permission request status");
    }

    if permission != Permission::Granted {
        tracing::debug!(?permission, "not showing push notification");
        return Ok(Dispatch::Skipped(permission));
    }

    let content = PushContent::decode_payload(payload);
    tracing::debug!(title = %content.title, "showing push notification");
    ctx.notifier.show(&content.title, &content.options()).await?;
    Ok(Dispatch::Shown)
}
