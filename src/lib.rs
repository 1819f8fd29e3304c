//! Terminal reader for tag-filtered article feeds.
//!
//! The pagination logic lives in [`feed`] and is independent of the
//! terminal: [`feed::reduce`] folds events into [`feed::FeedState`] and
//! describes the fetch to issue, [`feed::ScrollSentinel`] turns scroll
//! positions into throttled page advances, and [`feed::FeedClient`] talks to
//! the upstream API. [`app`] and [`ui`] wire those into a ratatui screen.

pub mod app;
pub mod config;
pub mod feed;
pub mod ui;
pub mod util;
