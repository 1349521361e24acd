//! Stable exit codes for check-in CLI commands.

/// Command succeeded; `chat` ended normally; `scan` found nothing.
pub const OK: i32 = 0;
/// Command failed due to invalid config, arguments, or I/O errors.
pub const INVALID: i32 = 1;
/// `scan` matched a risk term, or `chat` ended in the safety state.
pub const SAFETY: i32 = 3;
