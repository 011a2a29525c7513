//! Record Store Module
//!
//! Persistent student records behind the `StudentStore` trait. The service
//! layer only sees the trait, so the SQLite store and the in-memory store are
//! interchangeable.

mod csv_import;
mod memory;
mod sqlite;


use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewStudent, Student, StudentUpdate};

pub use csv_import::{read_students, read_students_from};
pub use memory::MemoryStudentStore;
pub use sqlite::SqliteStudentStore;

// == Store Error ==
/// Failures raised by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite reported an error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The import source could not be opened
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A row of the import source is malformed or invalid
    #[error("Import failed at line {line}: {message}")]
    Import { line: u64, message: String },

    /// Lock poisoning or a failed blocking task
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Student Store ==
/// Data-access interface over the student table.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn insert(&self, student: NewStudent) -> Result<Student, StoreError>;

    /// Returns every record ordered by id ascending.
    async fn select_all(&self) -> Result<Vec<Student>, StoreError>;

    /// Applies `update` to the record with `id`.
    ///
    /// Returns `false` when no such record exists.
    async fn update(&self, id: i64, update: &StudentUpdate) -> Result<bool, StoreError>;

    /// Removes the record with `id`. Returns `false` when it does not exist.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Inserts all records in one transaction and returns how many were written.
    async fn insert_many(&self, students: Vec<NewStudent>) -> Result<usize, StoreError>;

    /// Deletes every record whose id is in `ids` in one transaction.
    ///
    /// Ids without a record are skipped. Returns the number of deleted records.
    async fn bulk_delete(&self, ids: &[i64]) -> Result<usize, StoreError>;

    /// Imports a CSV file. Either every row is inserted or none is.
    async fn import_csv(&self, path: &Path) -> Result<usize, StoreError> {
        let path = path.to_path_buf();
        let students = tokio::task::spawn_blocking(move || read_students(&path))
            .await
            .map_err(|e| StoreError::Internal(format!("CSV reader task failed: {}", e)))??;

        self.insert_many(students).await
    }
}
