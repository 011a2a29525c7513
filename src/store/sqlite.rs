//! SQLite student store
//!
//! One process-wide connection behind a mutex. Every call runs on the blocking
//! pool so the request handlers never block the runtime.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::{StoreError, StudentStore};
use crate::models::{NewStudent, Student, StudentUpdate};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    lastname  TEXT    NOT NULL,
    firstname TEXT    NOT NULL,
    faculty   TEXT    NOT NULL,
    course    INTEGER NOT NULL,
    result    REAL    NOT NULL
);
"#;

// == Sqlite Student Store ==
/// Student store backed by a SQLite database file.
#[derive(Clone)]
pub struct SqliteStudentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStudentStore {
    /// Opens or creates the database at `path` and ensures the schema exists.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening SQLite database at {:?}", path);

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::with_schema(conn)
    }

    /// Opens an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory SQLite database");
        Self::with_schema(Connection::open_in_memory()?)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::Internal(format!("Lock poisoned: {}", e)))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("Blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl StudentStore for SqliteStudentStore {
    async fn insert(&self, student: NewStudent) -> Result<Student, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO students (lastname, firstname, faculty, course, result)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    student.lastname,
                    student.firstname,
                    student.faculty,
                    student.course,
                    student.result
                ],
            )?;
            Ok(student.into_student(conn.last_insert_rowid()))
        })
        .await
    }

    async fn select_all(&self) -> Result<Vec<Student>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, lastname, firstname, faculty, course, result
                 FROM students ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Student {
                    id: row.get(0)?,
                    lastname: row.get(1)?,
                    firstname: row.get(2)?,
                    faculty: row.get(3)?,
                    course: row.get(4)?,
                    result: row.get(5)?,
                })
            })?;

            let students = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(students)
        })
        .await
    }

    async fn update(&self, id: i64, update: &StudentUpdate) -> Result<bool, StoreError> {
        let update = update.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE students SET
                    lastname  = COALESCE(?1, lastname),
                    firstname = COALESCE(?2, firstname),
                    faculty   = COALESCE(?3, faculty),
                    course    = COALESCE(?4, course),
                    result    = COALESCE(?5, result)
                 WHERE id = ?6",
                params![
                    update.lastname,
                    update.firstname,
                    update.faculty,
                    update.course,
                    update.result,
                    id
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM students WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn insert_many(&self, students: Vec<NewStudent>) -> Result<usize, StoreError> {
        self.with_conn(move |conn| {
            // Dropping the transaction without commit rolls it back.
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO students (lastname, firstname, faculty, course, result)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for student in &students {
                    stmt.execute(params![
                        student.lastname,
                        student.firstname,
                        student.faculty,
                        student.course,
                        student.result
                    ])?;
                }
            }
            tx.commit()?;
            Ok(students.len())
        })
        .await
    }

    async fn bulk_delete(&self, ids: &[i64]) -> Result<usize, StoreError> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut deleted = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM students WHERE id = ?1")?;
                for id in &ids {
                    deleted += stmt.execute(params![id])?;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
        .await
    }
}
