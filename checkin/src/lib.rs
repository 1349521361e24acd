//! Pause → Probe → Plan emotional check-in engine for children.
//!
//! A short guided conversation moves a child through a body check-in,
//! optional breathing, what happened, feelings, values and a concrete next
//! step, ending in a one-sentence commitment. Every free-text answer is
//! scanned for self-harm language first; a match ends the flow with a fixed
//! safety message.
//!
//! - **[`core`]**: Pure, deterministic logic (state machine, scanner, synonym
//!   tables, record projection). No I/O.
//! - **[`io`]**: Side-effecting operations (config, record log, plan card).
//!
//! [`store`] keeps live sessions in memory and [`turn`] coordinates core logic
//! with I/O for the CLI and the HTTP server.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
