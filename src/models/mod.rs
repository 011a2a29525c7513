//! Request and Response models for the student API
//!
//! This module defines the student record types and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;
pub mod student;

// Re-export commonly used types
pub use requests::{CredentialsRequest, FillDatabaseQuery, SessionQuery};
pub use responses::{
    CreatedResponse, ErrorResponse, HealthResponse, JobAcceptedResponse, LoginResponse,
    MessageResponse, StatsResponse, UserResponse,
};
pub use student::{NewStudent, Student, StudentUpdate};
