//! Pagination state machine for the tag feed.
//!
//! All transitions go through [`reduce`], which takes the current
//! [`FeedState`] and a [`FeedEvent`] and returns the next state plus the
//! fetch (if any) that the caller must issue. The reducer performs no IO, so
//! the whole accumulation/reset protocol is testable without a terminal or a
//! network.
//!
//! Every emitted [`FetchRequest`] carries the generation it was issued
//! under. Completions whose generation no longer matches are dropped, which
//! keeps a slow response for an old tag from being appended after a reset.

use super::model::Post;

/// Tag shown on first start when nothing else is configured.
pub const DEFAULT_TAG: &str = "React";
/// Page size restored on every tag change.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Accumulated feed state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub tag: String,
    /// 1-based page number of the most recently requested page.
    pub page: u32,
    pub per_page: u32,
    /// Posts in arrival order. Duplicates across pages are kept.
    pub posts: Vec<Post>,
    pub is_loading: bool,
    /// Last upstream error message, cleared by the next successful fetch.
    pub error: Option<String>,
    /// Bumped for every issued fetch.
    pub generation: u64,
    /// Page size that `SetTag` resets to.
    pub default_per_page: u32,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(DEFAULT_TAG, DEFAULT_PER_PAGE)
    }
}

impl FeedState {
    pub fn new(tag: impl Into<String>, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        Self {
            tag: tag.into(),
            page: 1,
            per_page,
            posts: Vec::new(),
            is_loading: false,
            error: None,
            generation: 0,
            default_per_page: per_page,
        }
    }

    /// Phase of the state machine derived from the flags.
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else {
            Phase::Idle
        }
    }

    /// 1-based index of the first post on the current page.
    pub fn first_index(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.saturating_sub(1)) + 1
    }

    /// Mark a fetch as in flight and describe it.
    fn issue_fetch(&mut self) -> FetchRequest {
        self.generation = self.generation.wrapping_add(1);
        self.is_loading = true;
        FetchRequest {
            generation: self.generation,
            tag: self.tag.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }

    fn reset(&mut self, page: u32, per_page: u32) {
        self.posts.clear();
        self.page = page.max(1);
        self.per_page = per_page.max(1);
    }
}

/// Coarse phase shown on the loading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Error,
}

/// Inputs to the reducer.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// First fetch after the view is mounted.
    Start,
    /// Switch the tag filter; restores the default page size.
    SetTag(String),
    /// Change the page size and jump to `page`, keeping the tag.
    SetPageSize { per_page: u32, page: u32 },
    /// The scroll sentinel reported the bottom of the list.
    AdvancePage,
    /// Re-issue the request for the current page without resetting.
    Reload,
    /// A fetch finished.
    PageLoaded {
        generation: u64,
        result: Result<Vec<Post>, String>,
    },
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub tag: String,
    pub page: u32,
    pub per_page: u32,
}

/// Apply `event` to `state`.
///
/// Returns the next state and the fetch to issue, if any. The returned
/// request always reflects the state *after* the transition, so a reset is
/// visible before its fetch goes out.
pub fn reduce(mut state: FeedState, event: FeedEvent) -> (FeedState, Option<FetchRequest>) {
    let fetch = match event {
        FeedEvent::Start | FeedEvent::Reload => Some(state.issue_fetch()),
        FeedEvent::SetTag(tag) => {
            state.tag = tag;
            let per_page = state.default_per_page;
            state.reset(1, per_page);
            Some(state.issue_fetch())
        }
        FeedEvent::SetPageSize { per_page, page } => {
            state.reset(page, per_page);
            Some(state.issue_fetch())
        }
        FeedEvent::AdvancePage => {
            // Overlapping page advances would append out of order.
            if state.is_loading {
                tracing::debug!(page = state.page, "Page advance ignored while loading");
                None
            } else {
                state.page = state.page.saturating_add(1);
                Some(state.issue_fetch())
            }
        }
        FeedEvent::PageLoaded { generation, result } => {
            // Each generation is consumed by its first completion.
            if !state.is_loading || generation != state.generation {
                tracing::debug!(
                    expected = state.generation,
                    got = generation,
                    loading = state.is_loading,
                    "Ignoring stale page"
                );
                return (state, None);
            }
            state.is_loading = false;
            match result {
                Ok(mut batch) => {
                    tracing::debug!(
                        tag = %state.tag,
                        page = state.page,
                        count = batch.len(),
                        "Page appended"
                    );
                    state.posts.append(&mut batch);
                    state.error = None;
                }
                Err(message) => {
                    tracing::warn!(tag = %state.tag, page = state.page, error = %message, "Page fetch failed");
                    state.error = Some(message);
                }
            }
            None
        }
    };
    (state, fetch)
}
