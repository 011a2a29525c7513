//! Integration Tests for API Endpoints
//!
//! Drives the router in-process with `oneshot` over the in-memory store and
//! cache, checking status codes, bodies and the store state behind them.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use student_registry::api::create_router;
use student_registry::auth::SessionRegistry;
use student_registry::cache::{CacheBackend, MemoryCache};
use student_registry::store::{MemoryStudentStore, StudentStore};
use student_registry::{AppState, JobRunner, StudentService};

// == Helper Functions ==

struct TestApp {
    app: Router,
    store: Arc<MemoryStudentStore>,
    jobs: Arc<JobRunner>,
    token: String,
}

impl TestApp {
    fn uri(&self, path: &str) -> String {
        format!("{}?session_id={}", path, self.token)
    }
}

async fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStudentStore::new());
    let cache = Arc::new(MemoryCache::new());
    cache.init().await.unwrap();
    let service = Arc::new(StudentService::new(
        store.clone(),
        cache,
        Duration::from_secs(300),
    ));
    let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(300)));
    sessions.register("admin", "secret1").await.unwrap();
    let session = sessions.login("admin", "secret1").await.unwrap();
    let jobs = Arc::new(JobRunner::spawn(service.clone(), 100));

    TestApp {
        app: create_router(AppState::new(service, sessions, jobs.clone())),
        store,
        jobs,
        token: session.session_id.to_string(),
    }
}

// Extractor rejections answer in plain text
async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn ivanov() -> Value {
    serde_json::json!({
        "lastname": "Ivanov",
        "firstname": "Ivan",
        "faculty": "Physics",
        "course": 2,
        "result": 87.5
    })
}

async fn wait_for_job(test: &TestApp, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, json) = send(&test.app, "GET", &test.uri(&format!("/jobs/{}", job_id)), None).await;
        assert_eq!(status, StatusCode::OK);
        if json["status"] == "succeeded" || json["status"] == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} did not finish", job_id);
}

// == Student CRUD Tests ==

#[tokio::test]
async fn test_create_list_update_list() {
    let test = create_test_app().await;

    let (status, json) = send(&test.app, "POST", &test.uri("/students/"), Some(ivanov())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["message"], "Student added successfully");

    let (status, json) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["lastname"], "Ivanov");
    assert_eq!(json[0]["course"], 2);

    let (status, _) = send(
        &test.app,
        "PATCH",
        &test.uri("/students/1"),
        Some(serde_json::json!({ "course": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&test.app, "GET", &test.uri("/students"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["course"], 3);
    assert_eq!(json[0]["firstname"], "Ivan");
}

#[tokio::test]
async fn test_repeated_listing_is_served_from_cache() {
    let test = create_test_app().await;
    send(&test.app, "POST", &test.uri("/students/"), Some(ivanov())).await;

    let (_, first) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    let (_, second) = send(&test.app, "GET", &test.uri("/students/"), None).await;

    assert_eq!(first, second);
    assert_eq!(test.store.select_calls(), 1);

    let (_, stats) = send(&test.app, "GET", "/stats", None).await;
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["invalidations"], 1);
}

#[tokio::test]
async fn test_delete_student() {
    let test = create_test_app().await;
    send(&test.app, "POST", &test.uri("/students/"), Some(ivanov())).await;
    send(&test.app, "GET", &test.uri("/students/"), None).await;

    let (status, json) = send(&test.app, "DELETE", &test.uri("/students/1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("deleted"));

    let (_, json) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_student_is_not_found() {
    let test = create_test_app().await;

    let (status, json) = send(
        &test.app,
        "PATCH",
        &test.uri("/students/42"),
        Some(serde_json::json!({ "course": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("42"));

    let (status, _) = send(&test.app, "DELETE", &test.uri("/students/42"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_student_is_rejected() {
    let test = create_test_app().await;
    let mut student = ivanov();
    student["course"] = serde_json::json!(0);

    let (status, json) = send(&test.app, "POST", &test.uri("/students/"), Some(student)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
    assert!(test.store.select_all().await.unwrap().is_empty());
}

// == Access Guard Tests ==

#[tokio::test]
async fn test_mutations_without_session_are_unauthorized() {
    let test = create_test_app().await;
    send(&test.app, "POST", &test.uri("/students/"), Some(ivanov())).await;
    send(&test.app, "GET", &test.uri("/students/"), None).await;
    let (_, before) = send(&test.app, "GET", "/stats", None).await;

    let requests = [
        ("POST", "/students/".to_string(), Some(ivanov())),
        ("PATCH", "/students/1".to_string(), Some(serde_json::json!({ "course": 5 }))),
        ("DELETE", "/students/1".to_string(), None),
        ("POST", "/delete_students/".to_string(), Some(serde_json::json!([1]))),
        ("POST", "/fill_database/?csv_path=/tmp/students.csv".to_string(), None),
        ("GET", "/students/".to_string(), None),
    ];

    for (method, uri, body) in requests {
        let (status, json) = send(&test.app, method, &uri, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(json.get("error").is_some());
    }

    // Listing cached before the rejected requests is still served
    let (_, after) = send(&test.app, "GET", "/stats", None).await;
    assert_eq!(after["invalidations"], before["invalidations"]);
    let (status, json) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["course"], 2);
    assert_eq!(test.store.select_calls(), 1);

    let students = test.store.select_all().await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].course, 2);
}

#[tokio::test]
async fn test_unknown_session_is_unauthorized() {
    let test = create_test_app().await;
    let uri = format!("/students/?session_id={}", uuid::Uuid::new_v4());

    let (status, _) = send(&test.app, "POST", &uri, Some(ivanov())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&test.app, "POST", "/students/?session_id=abc", Some(ivanov())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(test.store.select_all().await.unwrap().is_empty());
}

// == Background Job Tests ==

#[tokio::test]
async fn test_bulk_delete_skips_missing_ids() {
    let test = create_test_app().await;
    for _ in 0..3 {
        send(&test.app, "POST", &test.uri("/students/"), Some(ivanov())).await;
    }
    send(&test.app, "DELETE", &test.uri("/students/2"), None).await;

    let (status, json) = send(
        &test.app,
        "POST",
        &test.uri("/delete_students/"),
        Some(serde_json::json!([1, 2, 3])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("background"));

    let job = wait_for_job(&test, json["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "succeeded");
    assert_eq!(job["detail"], "Deleted 2 of 3 requested students");

    let (_, json) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_fill_database_imports_csv() {
    let test = create_test_app().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "lastname,firstname,faculty,course,result").unwrap();
    writeln!(file, "Petrova,Anna,Chemistry,1,91.0").unwrap();
    writeln!(file, "Sidorov,Pavel,History,4,73.5").unwrap();

    // Prime the cache so the import has something to invalidate
    send(&test.app, "GET", &test.uri("/students/"), None).await;

    let uri = format!(
        "/fill_database/?csv_path={}&session_id={}",
        file.path().display(),
        test.token
    );
    let (status, json) = send(&test.app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    test.jobs.shutdown().await;

    let (_, job) = send(
        &test.app,
        "GET",
        &test.uri(&format!("/jobs/{}", json["job_id"].as_str().unwrap())),
        None,
    )
    .await;
    assert_eq!(job["status"], "succeeded");
    assert_eq!(job["job"]["kind"], "import_csv");

    let (_, json) = send(&test.app, "GET", &test.uri("/students/"), None).await;
    let students = json.as_array().unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0]["lastname"], "Petrova");
    assert_eq!(students[1]["course"], 4);
}

#[tokio::test]
async fn test_fill_database_with_bad_row_imports_nothing() {
    let test = create_test_app().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "lastname,firstname,faculty,course,result").unwrap();
    writeln!(file, "Petrova,Anna,Chemistry,1,91.0").unwrap();
    writeln!(file, "Sidorov,Pavel,History,first,73.5").unwrap();

    let uri = format!(
        "/fill_database?csv_path={}&session_id={}",
        file.path().display(),
        test.token
    );
    let (status, json) = send(&test.app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let job = wait_for_job(&test, json["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "failed");
    assert!(test.store.select_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fill_database_requires_csv_path() {
    let test = create_test_app().await;

    let (status, _) = send(&test.app, "POST", &test.uri("/fill_database/"), None).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let test = create_test_app().await;
    let uri = test.uri(&format!("/jobs/{}", uuid::Uuid::new_v4()));

    let (status, json) = send(&test.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

// == Auth Endpoint Tests ==

#[tokio::test]
async fn test_register_login_logout() {
    let test = create_test_app().await;
    let credentials = serde_json::json!({ "username": "maria", "password": "hunter22" });

    let (status, json) = send(&test.app, "POST", "/auth/register", Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "maria");

    let (status, _) = send(&test.app, "POST", "/auth/register", Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(&test.app, "POST", "/auth/login", Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = json["session_id"].as_str().unwrap().to_string();
    assert!(json.get("expires_at").is_some());

    let uri = format!("/students/?session_id={}", token);
    let (status, _) = send(&test.app, "POST", &uri, Some(ivanov())).await;
    assert_eq!(status, StatusCode::OK);

    let logout = format!("/auth/logout?session_id={}", token);
    let (status, _) = send(&test.app, "POST", &logout, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&test.app, "POST", &uri, Some(ivanov())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(test.store.select_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let test = create_test_app().await;
    let credentials = serde_json::json!({ "username": "admin", "password": "wrong-one" });

    let (status, json) = send(&test.app, "POST", "/auth/login", Some(credentials)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json.get("error").is_some());
}

// == Service Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let test = create_test_app().await;

    let (status, json) = send(&test.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["cache_backend"], "memory");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_stats_endpoint_starts_empty() {
    let test = create_test_app().await;

    let (status, json) = send(&test.app, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 0);
    assert_eq!(json["misses"], 0);
    assert_eq!(json["hit_rate"], 0.0);
}
