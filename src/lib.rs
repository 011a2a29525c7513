//! Student Registry - student records over HTTP
//!
//! CRUD over student records with a read-through listing cache that is
//! invalidated on every write, and background bulk import/delete jobs.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use service::StudentService;
pub use tasks::{spawn_cleanup_task, JobRunner};
