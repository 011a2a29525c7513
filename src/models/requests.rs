//! Request DTOs for the student API
//!
//! Query strings and bodies that are not student records themselves.

use serde::Deserialize;

/// Query carrying the session token (`?session_id=...`).
///
/// The token is optional at the extractor level so a missing token reaches the
/// access guard and becomes a 401 instead of a query rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Query of `POST /fill_database/`.
#[derive(Debug, Clone, Deserialize)]
pub struct FillDatabaseQuery {
    pub csv_path: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl FillDatabaseQuery {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.csv_path.trim().is_empty() {
            return Some("csv_path cannot be empty".to_string());
        }
        None
    }
}

/// Body of `/auth/register` and `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}
