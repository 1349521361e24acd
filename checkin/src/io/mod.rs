//! I/O helpers for check-in commands.

pub mod card;
pub mod config;
pub mod init;
pub mod record_log;
