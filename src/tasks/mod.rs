//! Background Tasks Module
//!
//! # Tasks
//! - Job runner: executes bulk imports and bulk deletes outside the request
//! - Cache sweeper: removes expired entries from the in-memory cache backend

mod cleanup;
mod runner;

pub use cleanup::spawn_cleanup_task;
pub use runner::{Job, JobRecord, JobRunner, JobStatus};
