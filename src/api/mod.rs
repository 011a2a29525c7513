//! API Module
//!
//! HTTP handlers and routing for the student service REST API.
//!
//! # Endpoints
//! - `POST /students/` - Create a student
//! - `GET /students/` - List students (cached)
//! - `PATCH /students/:id` - Update a student
//! - `DELETE /students/:id` - Delete a student
//! - `POST /fill_database/` - Import a CSV file in the background
//! - `POST /delete_students/` - Delete a list of students in the background
//! - `GET /jobs/:job_id` - Background job status
//! - `POST /auth/register`, `/auth/login`, `/auth/logout` - Sessions
//! - `GET /stats` - Listing cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
