//! Use-case services over the store and transport collaborators.
//!
//! # Responsibility
//! - Resolve today's row and apply increments (`resolver`, `transactor`).
//! - Build read-only summaries (`report`).
//! - Handle one message end to end (`handler`) and fan messages out to
//!   workers (`dispatch`).

pub mod dispatch;
pub mod handler;
pub mod report;
pub mod resolver;
pub mod transactor;
