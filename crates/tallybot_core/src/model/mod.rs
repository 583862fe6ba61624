//! Domain model for chat-driven tally entries.
//!
//! # Responsibility
//! - Define identifiers and payloads shared by the pipeline stages.
//! - Keep sheet addressing (`CellRef`) independent from any store backend.
//!
//! # Invariants
//! - A `Unit` is always a single upper-case letter.
//! - A `ParsedEntry` always carries `quantity >= 1`.

pub mod entry;
pub mod message;
