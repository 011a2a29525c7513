//! Student Service
//!
//! Orchestrates the record store and the listing cache.
//!
//! Listing is read-through: the cached JSON under [`STUDENTS_LIST_KEY`] is
//! returned byte-for-byte when present, otherwise the store is queried and the
//! serialized result is cached for the listing TTL.
//!
//! Every write that changes the store bumps the write generation and then
//! deletes the cached listing. A listing only writes its snapshot back if the
//! generation did not move while it was reading the store, and deletes it again
//! if the generation moved while the write was in flight.
//!
//! Cache failures never reach the caller: a failed read is a miss, a failed
//! write or delete is logged and counted.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheBackend, CacheStats, CacheStatsSnapshot, STUDENTS_LIST_KEY};
use crate::error::{ApiError, Result};
use crate::models::{NewStudent, Student, StudentUpdate};
use crate::store::{StoreError, StudentStore};

// == Student Service ==
pub struct StudentService {
    store: Arc<dyn StudentStore>,
    cache: Arc<dyn CacheBackend>,
    list_ttl: Duration,
    generation: AtomicU64,
    stats: CacheStats,
}

impl StudentService {
    /// Creates a service over an already initialized cache.
    pub fn new(
        store: Arc<dyn StudentStore>,
        cache: Arc<dyn CacheBackend>,
        list_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            list_ttl,
            generation: AtomicU64::new(0),
            stats: CacheStats::new(),
        }
    }

    /// The cache this service reads through.
    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    // == Create ==
    pub async fn create(&self, student: NewStudent) -> Result<Student> {
        if let Some(msg) = student.validate() {
            return Err(ApiError::InvalidRequest(msg));
        }

        let created = self.store.insert(student).await?;
        self.invalidate_listing().await;

        info!(id = created.id, "Student created");
        Ok(created)
    }

    // == List ==
    /// Returns the JSON array of all students.
    pub async fn list_json(&self) -> Result<String> {
        match self.cache.get(STUDENTS_LIST_KEY).await {
            Ok(Some(cached)) => {
                self.stats.record_hit();
                debug!(key = STUDENTS_LIST_KEY, "Listing served from cache");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(err) => {
                self.stats.record_read_fallback();
                warn!(key = STUDENTS_LIST_KEY, error = %err, "Cache read failed, querying store");
            }
        }
        self.stats.record_miss();

        let generation = self.generation.load(Ordering::Acquire);
        let students = self.store.select_all().await?;
        let body = serde_json::to_string(&students)?;

        if self.generation.load(Ordering::Acquire) != generation {
            debug!(
                key = STUDENTS_LIST_KEY,
                "Store changed during listing, not caching snapshot"
            );
            return Ok(body);
        }

        if let Err(err) = self
            .cache
            .set(STUDENTS_LIST_KEY, &body, self.list_ttl)
            .await
        {
            self.stats.record_write_fallback();
            warn!(key = STUDENTS_LIST_KEY, error = %err, "Cache write failed");
            return Ok(body);
        }

        // A write that landed while the set was in flight may have deleted
        // the key before our snapshot arrived
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(
                key = STUDENTS_LIST_KEY,
                "Store changed while caching listing, dropping snapshot"
            );
            self.delete_listing().await;
        }

        Ok(body)
    }

    /// Typed listing, always served through the cache.
    pub async fn list(&self) -> Result<Vec<Student>> {
        let body = self.list_json().await?;
        Ok(serde_json::from_str(&body)?)
    }

    // == Update ==
    pub async fn update(&self, id: i64, update: &StudentUpdate) -> Result<()> {
        if let Some(msg) = update.validate() {
            return Err(ApiError::InvalidRequest(msg));
        }

        if !self.store.update(id, update).await? {
            return Err(student_not_found(id));
        }
        self.invalidate_listing().await;

        info!(id, "Student updated");
        Ok(())
    }

    // == Delete ==
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(student_not_found(id));
        }
        self.invalidate_listing().await;

        info!(id, "Student deleted");
        Ok(())
    }

    // == Bulk Operations ==
    /// Imports a CSV file; all rows or none. Returns the number of inserted rows.
    pub async fn import_csv(&self, path: &Path) -> std::result::Result<usize, StoreError> {
        let inserted = self.store.import_csv(path).await?;
        if inserted > 0 {
            self.invalidate_listing().await;
        }
        Ok(inserted)
    }

    /// Deletes every listed id that exists. Returns the number of deleted rows.
    pub async fn bulk_delete(&self, ids: &[i64]) -> std::result::Result<usize, StoreError> {
        let deleted = self.store.bulk_delete(ids).await?;
        if deleted > 0 {
            self.invalidate_listing().await;
        }
        Ok(deleted)
    }

    // == Invalidation ==
    async fn invalidate_listing(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.delete_listing().await;
    }

    async fn delete_listing(&self) {
        self.stats.record_invalidation();

        if let Err(err) = self.cache.delete(STUDENTS_LIST_KEY).await {
            self.stats.record_write_fallback();
            warn!(key = STUDENTS_LIST_KEY, error = %err, "Cache invalidation failed");
        }
    }
}

fn student_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Student {} not found", id))
}
