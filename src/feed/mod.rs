//! Tag feed: upstream client, pagination state machine and scroll sentinel.
//!
//! - [`model`] - serde types for the items endpoint
//! - [`client`] - HTTP fetch of one page with timeout and size limit
//! - [`state`] - reducer that owns tag/page/page size and the accumulated posts
//! - [`sentinel`] - throttled bottom-of-list detection
//!
//! # Example
//!
//! ```ignore
//! use tagfeed::feed::{reduce, FeedEvent, FeedState};
//!
//! let (state, fetch) = reduce(FeedState::default(), FeedEvent::Start);
//! if let Some(request) = fetch {
//!     let result = client.fetch_page(&request).await.map_err(|e| e.to_string());
//!     let (state, _) = reduce(state, FeedEvent::PageLoaded {
//!         generation: request.generation,
//!         result,
//!     });
//! }
//! ```

pub mod client;
pub mod model;
pub mod sentinel;
pub mod state;

pub use client::{is_valid_tag, FeedClient, FetchError, DEFAULT_BASE_URL};
pub use model::{Author, Post, PostTag};
pub use sentinel::{ScrollMetrics, ScrollSentinel, DEFAULT_THROTTLE};
pub use state::{
    reduce, FeedEvent, FeedState, FetchRequest, Phase, DEFAULT_PER_PAGE, DEFAULT_TAG,
};
