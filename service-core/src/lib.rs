//! service-core: Shared infrastructure for the analytics console workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
