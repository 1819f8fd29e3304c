//! Helpers shared by the input and event handlers.

use crate::app::{App, AppEvent};
use crate::feed::{FeedClient, FetchRequest};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Run `future`, turning a panic into `Err(message)`.
///
/// Spawned tasks use this so a panic still reaches the UI as a failed
/// page instead of being swallowed by the runtime.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Issue `request` if the reducer asked for one.
///
/// Any previous fetch is aborted first: a new request always carries a newer
/// generation, so the old result would be discarded anyway.
pub(super) fn dispatch_fetch(
    app: &mut App,
    request: Option<FetchRequest>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let Some(request) = request else {
        return;
    };

    if let Some(handle) = app.fetch_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous fetch task");
    }

    tracing::info!(
        tag = %request.tag,
        page = request.page,
        per_page = request.per_page,
        generation = request.generation,
        "Requesting page"
    );

    app.fetch_handle = Some(spawn_fetch(
        app.client.clone(),
        request,
        event_tx.clone(),
    ));
}

/// Spawn a task that fetches one page and reports `AppEvent::PageLoaded`.
fn spawn_fetch(
    client: FeedClient,
    request: FetchRequest,
    event_tx: mpsc::Sender<AppEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let generation = request.generation;
        let event = match catch_task_panic(client.fetch_page(&request)).await {
            Ok(result) => AppEvent::PageLoaded {
                generation,
                result: result.map_err(|e| e.to_string()),
            },
            Err(error) => {
                tracing::error!(task = "fetch", error = %error, "Background task panicked");
                // Still resolve the request so the feed leaves the loading state.
                AppEvent::PageLoaded {
                    generation,
                    result: Err(format!("Internal error in fetch task: {}", error)),
                }
            }
        };

        if let Err(e) = event_tx.send(event).await {
            tracing::warn!(error = %e, "Failed to send page result (receiver dropped)");
        }
    })
}
