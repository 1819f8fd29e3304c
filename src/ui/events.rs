//! Application event handling.
//!
//! Processes background task completions and folds them into the feed.

use crate::app::{App, AppEvent};
use crate::feed::FeedEvent;

/// Handle application events from background tasks.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::PageLoaded { generation, result } => {
            handle_page_loaded(app, generation, result);
        }
    }
}

fn handle_page_loaded(
    app: &mut App,
    generation: u64,
    result: Result<Vec<crate::feed::Post>, String>,
) {
    // Mirrors the reducer's guard: only the in-flight generation is accepted.
    let accepted = app.feed.is_loading && generation == app.feed.generation;
    if accepted {
        app.fetch_handle = None;
    }

    let empty_page = matches!(&result, Ok(batch) if batch.is_empty());
    let before = app.feed.posts.len();

    let follow_up = app.apply(FeedEvent::PageLoaded { generation, result });
    debug_assert!(follow_up.is_none());

    if !accepted {
        return;
    }

    if empty_page && app.feed.page > 1 {
        app.set_status(format!("No posts on page {}", app.feed.page));
    } else if app.feed.posts.len() > before {
        tracing::info!(
            tag = %app.feed.tag,
            page = app.feed.page,
            total = app.feed.posts.len(),
            "Page loaded"
        );
    }
}
