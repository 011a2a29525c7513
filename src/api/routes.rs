//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_student_handler, delete_student_handler, delete_students_handler,
    fill_database_handler, health_handler, job_status_handler, list_students_handler,
    login_handler, logout_handler, register_handler, stats_handler, update_student_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// Collection routes answer with and without the trailing slash.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let students = post(create_student_handler).get(list_students_handler);
    let student = patch(update_student_handler).delete(delete_student_handler);

    Router::new()
        .route("/students", students.clone())
        .route("/students/", students)
        .route("/students/:id", student)
        .route("/fill_database", post(fill_database_handler))
        .route("/fill_database/", post(fill_database_handler))
        .route("/delete_students", post(delete_students_handler))
        .route("/delete_students/", post(delete_students_handler))
        .route("/jobs/:job_id", get(job_status_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
