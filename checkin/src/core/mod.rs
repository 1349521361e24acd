//! Deterministic, pure logic for the check-in flow.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! sessions and return deterministic outputs suitable for tests. Time enters
//! only as an explicit `now` argument.

pub mod engine;
pub mod invariants;
pub mod prompts;
pub mod record;
pub mod responder;
pub mod safety;
pub mod statement;
pub mod synonyms;
pub mod types;
