pub mod backend;
pub mod metrics;

pub use backend::{BackendClient, BackendError, Caller};
