//! Small helpers shared by the UI layer.
//!
//! - **Text**: width-aware truncation, control character stripping and
//!   relative ages for post timestamps
//! - **URLs**: validation before handing a post link to the system browser

mod text;
mod url_check;

pub use text::{display_width, format_age, strip_control_chars, truncate_to_width};
pub use url_check::{validate_url_for_open, UrlValidationError};
