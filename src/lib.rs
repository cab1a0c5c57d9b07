//! Shared image gallery with category inference and tiered read-through
//! persistence.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
