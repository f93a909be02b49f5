//! kube-job-runner - submit a one-off Kubernetes Job and clean it up again
//!
//! The library builds a `batch/v1` Job from a `JobDescriptor`, creates it
//! through the cluster API and deletes it right after.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-export commonly used types
pub use error::{AppError, Result};
