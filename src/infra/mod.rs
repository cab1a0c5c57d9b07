//! Storage adapters, HTTP surface and runtime bootstrap.

pub mod db;
pub mod error;
pub mod fallback;
pub mod http;
pub mod mirror;
pub mod telemetry;
