//! Application services: gallery reads, tiered fetching and mutations.

pub mod error;
pub mod gallery;
pub mod mutations;
pub mod repos;
pub mod tiered;
