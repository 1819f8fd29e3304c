//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse handling
//! - `events` - Fetch result processing
//! - `helpers` - Fetch dispatch and panic capture
//! - `render` - Screen layout, tag bar, page controls
//! - `posts` - Post card list
//! - `status` - Status bar

mod events;
mod helpers;
mod input;
mod loop_runner;
mod posts;
mod render;
mod status;

pub use loop_runner::{run, Action};
