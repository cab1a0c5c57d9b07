//! Domain layer types and invariants.

pub mod artifacts;
pub mod classify;
pub mod entities;
pub mod error;
pub mod types;
