//! API Handlers
//!
//! HTTP request handlers for each endpoint. Every student and job handler runs
//! the access guard before anything else.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::auth::{AccessGuard, SessionRegistry};
use crate::error::{ApiError, Result};
use crate::models::{
    CreatedResponse, CredentialsRequest, FillDatabaseQuery, HealthResponse, JobAcceptedResponse,
    LoginResponse, MessageResponse, NewStudent, SessionQuery, StatsResponse, StudentUpdate,
    UserResponse,
};
use crate::service::StudentService;
use crate::tasks::{Job, JobRecord, JobRunner};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store and listing cache orchestration
    pub service: Arc<StudentService>,
    /// Token check run by protected endpoints
    pub guard: Arc<dyn AccessGuard>,
    /// Users and sessions behind `/auth`
    pub sessions: Arc<SessionRegistry>,
    /// Background job queue
    pub jobs: Arc<JobRunner>,
}

impl AppState {
    /// Creates a new AppState whose guard is the session registry.
    pub fn new(
        service: Arc<StudentService>,
        sessions: Arc<SessionRegistry>,
        jobs: Arc<JobRunner>,
    ) -> Self {
        Self {
            service,
            guard: sessions.clone(),
            sessions,
            jobs,
        }
    }

    async fn authorize(&self, session_id: Option<&str>) -> Result<()> {
        self.guard.check(session_id).await?;
        Ok(())
    }
}

// == Students ==

/// Handler for POST /students/
pub async fn create_student_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(student): Json<NewStudent>,
) -> Result<Json<CreatedResponse>> {
    state.authorize(query.session_id.as_deref()).await?;

    let created = state.service.create(student).await?;
    Ok(Json(CreatedResponse::new(created.id)))
}

/// Handler for GET /students/
///
/// Writes the listing JSON as-is so a cached snapshot reaches the client
/// unchanged.
pub async fn list_students_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Response> {
    state.authorize(query.session_id.as_deref()).await?;

    let body = state.service.list_json().await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Handler for PATCH /students/:id
pub async fn update_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SessionQuery>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<MessageResponse>> {
    state.authorize(query.session_id.as_deref()).await?;

    state.service.update(id, &update).await?;
    Ok(Json(MessageResponse::new("Student data updated successfully")))
}

/// Handler for DELETE /students/:id
pub async fn delete_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MessageResponse>> {
    state.authorize(query.session_id.as_deref()).await?;

    state.service.delete(id).await?;
    Ok(Json(MessageResponse::new("Student deleted successfully")))
}

// == Background Jobs ==

/// Handler for POST /fill_database/
pub async fn fill_database_handler(
    State(state): State<AppState>,
    Query(query): Query<FillDatabaseQuery>,
) -> Result<Json<JobAcceptedResponse>> {
    state.authorize(query.session_id.as_deref()).await?;
    if let Some(msg) = query.validate() {
        return Err(ApiError::InvalidRequest(msg));
    }

    let job_id = state
        .jobs
        .enqueue(Job::ImportCsv {
            path: PathBuf::from(query.csv_path),
        })
        .await?;

    Ok(Json(JobAcceptedResponse::new(
        "Database fill started in background",
        job_id,
    )))
}

/// Handler for POST /delete_students/
pub async fn delete_students_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(ids): Json<Vec<i64>>,
) -> Result<Json<JobAcceptedResponse>> {
    state.authorize(query.session_id.as_deref()).await?;

    let job_id = state.jobs.enqueue(Job::DeleteStudents { ids }).await?;
    Ok(Json(JobAcceptedResponse::new(
        "Student deletion started in background",
        job_id,
    )))
}

/// Handler for GET /jobs/:job_id
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<JobRecord>> {
    state.authorize(query.session_id.as_deref()).await?;

    state
        .jobs
        .status(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))
}

// == Auth ==

/// Handler for POST /auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>> {
    let user = state.sessions.register(&req.username, &req.password).await?;
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

/// Handler for POST /auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let session = state.sessions.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse {
        session_id: session.session_id.to_string(),
        expires_at: session.expires_at,
    }))
}

/// Handler for POST /auth/logout
pub async fn logout_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MessageResponse>> {
    let token = query
        .session_id
        .ok_or_else(|| ApiError::Unauthorized("Missing session_id".to_string()))?;
    state.sessions.logout(&token).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}

// == Service ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.service.stats();

    Json(StatsResponse {
        hits: stats.hits,
        misses: stats.misses,
        read_fallbacks: stats.read_fallbacks,
        write_fallbacks: stats.write_fallbacks,
        invalidations: stats.invalidations,
        hit_rate: stats.hit_rate(),
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.service.cache().name()))
}
