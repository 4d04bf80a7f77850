//! cloudmirror pipeline
//!
//! Runs parsed manifest tasks through the registry adapters:
//!
//! - [`Scheduler`] admits at most N tasks at once through a shared semaphore
//! - each task pushes to all of its destinations; the attempt succeeds only
//!   if every destination succeeded
//! - [`RetryPolicy`] repeats the whole attempt with a fixed delay
//! - [`aggregate`] folds the per-task outcomes into a [`MirrorResult`]
//!
//! [`Mirror`] wires these together with authentication and pre-flight
//! validation.
//!
//! [`MirrorResult`]: cloudmirror_core::MirrorResult

pub mod aggregate;
pub mod error;
pub mod mirror;
pub mod retry;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use aggregate::aggregate;
pub use error::{PipelineError, Result};
pub use mirror::{Mirror, MirrorReport};
pub use retry::{RetryPolicy, TaskOutcome};
pub use scheduler::{Scheduler, TaskReport};
