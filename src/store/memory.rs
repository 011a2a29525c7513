//! In-memory student store
//!
//! Same contract as the SQLite store without a database file. Counts listing
//! queries so callers can tell whether a read reached the store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StudentStore};
use crate::models::{NewStudent, Student, StudentUpdate};

#[derive(Debug)]
struct Rows {
    students: BTreeMap<i64, Student>,
    next_id: i64,
}

// == Memory Student Store ==
/// Student store kept entirely in process memory.
#[derive(Debug)]
pub struct MemoryStudentStore {
    rows: RwLock<Rows>,
    select_calls: AtomicU64,
}

impl MemoryStudentStore {
    /// Creates an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                students: BTreeMap::new(),
                next_id: 1,
            }),
            select_calls: AtomicU64::new(0),
        }
    }

    /// Number of `select_all` calls served so far.
    pub fn select_calls(&self) -> u64 {
        self.select_calls.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStudentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn insert(&self, student: NewStudent) -> Result<Student, StoreError> {
        let mut rows = self.rows.write().await;
        let id = rows.next_id;
        rows.next_id += 1;

        let student = student.into_student(id);
        rows.students.insert(id, student.clone());
        Ok(student)
    }

    async fn select_all(&self) -> Result<Vec<Student>, StoreError> {
        self.select_calls.fetch_add(1, Ordering::Relaxed);
        let rows = self.rows.read().await;
        Ok(rows.students.values().cloned().collect())
    }

    async fn update(&self, id: i64, update: &StudentUpdate) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        match rows.students.get_mut(&id) {
            Some(student) => {
                update.apply_to(student);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        Ok(rows.students.remove(&id).is_some())
    }

    async fn insert_many(&self, students: Vec<NewStudent>) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().await;
        let count = students.len();
        for student in students {
            let id = rows.next_id;
            rows.next_id += 1;
            rows.students.insert(id, student.into_student(id));
        }
        Ok(count)
    }

    async fn bulk_delete(&self, ids: &[i64]) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().await;
        Ok(ids
            .iter()
            .filter(|&&id| rows.students.remove(&id).is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(lastname: &str) -> NewStudent {
        NewStudent {
            lastname: lastname.to_string(),
            firstname: "Anna".to_string(),
            faculty: "Math".to_string(),
            course: 1,
            result: 75.0,
        }
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MemoryStudentStore::new();
        let first = store.insert(student("A")).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.insert(student("B")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_select_calls_counter() {
        let store = MemoryStudentStore::new();
        assert_eq!(store.select_calls(), 0);

        store.select_all().await.unwrap();
        store.select_all().await.unwrap();
        assert_eq!(store.select_calls(), 2);
    }

    #[tokio::test]
    async fn test_bulk_delete_counts_only_existing() {
        let store = MemoryStudentStore::new();
        store
            .insert_many(vec![student("A"), student("B"), student("C")])
            .await
            .unwrap();

        let deleted = store.bulk_delete(&[1, 3, 42]).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = store.select_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].lastname, "B");
    }
}
