//! Response DTOs for the student API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Plain confirmation message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// Creates a new MessageResponse
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `POST /students/`
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    /// Success message
    pub message: String,
    /// Id assigned by the store
    pub id: i64,
}

impl CreatedResponse {
    /// Creates a new CreatedResponse
    pub fn new(id: i64) -> Self {
        Self {
            message: "Student added successfully".to_string(),
            id,
        }
    }
}

/// Acknowledgement for a job handed to the background runner
#[derive(Debug, Clone, Serialize)]
pub struct JobAcceptedResponse {
    /// Success message
    pub message: String,
    /// Id to poll at `GET /jobs/{job_id}`
    pub job_id: Uuid,
}

impl JobAcceptedResponse {
    /// Creates a new JobAcceptedResponse
    pub fn new(message: impl Into<String>, job_id: Uuid) -> Self {
        Self {
            message: message.into(),
            job_id,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Listings served from the cache
    pub hits: u64,
    /// Listings that had to query the store
    pub misses: u64,
    /// Cache reads that failed and were treated as misses
    pub read_fallbacks: u64,
    /// Cache writes or invalidations that failed
    pub write_fallbacks: u64,
    /// Number of listing invalidations
    pub invalidations: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Name of the configured cache backend
    pub cache_backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache_backend: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            cache_backend: cache_backend.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

/// Response body for `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
