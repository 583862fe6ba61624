//! Text classification stages.
//!
//! # Responsibility
//! - Turn raw chat text into a validated `ParsedEntry`.
//! - Stay pure: no stage here touches the store or the transport.
//!
//! # Invariants
//! - Stages run in the fixed order normalize -> classify -> validate.
//! - The first failing stage decides the error kind.

pub mod classify;
pub mod normalize;
pub mod validate;

pub use classify::{classify, ClassifyError};
pub use normalize::{normalize, NormalizedText, FLAG_TOKEN};
pub use validate::UnitValidator;
