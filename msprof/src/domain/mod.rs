//! Domain model for msprof
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - A single identifier space for command-line options
//! - Structured error handling

pub mod arg_id;
pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use arg_id::{join_args, ArgId};
pub use types::{DeviceId, JobId, RunStatus, DEFAULT_HOST_ID};

pub use errors::{DynamicError, LaunchError, ModeError, TaskError, ValidationError};
