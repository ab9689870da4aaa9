// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod analysis;
pub mod config;
pub mod data;
pub mod engine;
pub mod identity;
