//! Metadata store - durable drawing records with a live query
//!
//! This service wraps the connection pool and is the single shared mutable
//! resource of the engine. Every mutation rebroadcasts the full table so each
//! subscriber (local view, server view) can re-filter independently.

use crate::domain::drawing::{Drawing, StorageLocation};
use crate::error::Result;
use crate::infrastructure::storage::db::dao;
use crate::infrastructure::storage::db::models::drawing::{DrawingChanges, NewDrawing};
use crate::infrastructure::storage::db::pool::DbPool;
use chrono::Utc;
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the live-query channel; slow subscribers skip to the latest
/// emission instead of blocking writers.
const LIVE_QUERY_CAPACITY: usize = 20;

pub struct MetadataStore {
    db: Arc<DbPool>,
    broadcaster: broadcast::Sender<Vec<Drawing>>,
}

impl MetadataStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        let (broadcaster, _) = broadcast::channel(LIVE_QUERY_CAPACITY);
        Self { db, broadcaster }
    }

    /// Subscribe to the live query.
    ///
    /// Each receiver gets the full record list after every mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Drawing>> {
        self.broadcaster.subscribe()
    }

    // ========== Mutations ==========

    /// Insert a new record and return it with its assigned id.
    ///
    /// Fails with `Conflict` when the owner already has a record with this
    /// file name; first write wins, there is no separate existence check.
    pub async fn insert(
        &self,
        file_name: &str,
        file_path: &str,
        storage_location: StorageLocation,
        owner_username: Option<&str>,
    ) -> Result<Drawing> {
        let mut conn = self.db.get()?;
        let created_at = Utc::now().timestamp() as i32;
        let new_drawing = NewDrawing::new(
            file_name,
            file_path,
            storage_location,
            owner_username,
            created_at,
        );
        let id = dao::drawing::insert_drawing(&mut conn, &new_drawing)?;
        self.notify_subscribers(&mut conn);
        Ok(Drawing {
            id,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            storage_location,
            owner_username: owner_username.map(|s| s.to_string()),
            created_at,
        })
    }

    /// Full-row replace by id; a no-op when the id is unknown.
    pub async fn update(&self, drawing: &Drawing) -> Result<()> {
        let mut conn = self.db.get()?;
        let changes = DrawingChanges::from(drawing);
        dao::drawing::update_drawing(&mut conn, drawing.id, &changes)?;
        self.notify_subscribers(&mut conn);
        Ok(())
    }

    /// Move a record to another storage location.
    pub async fn set_location(&self, id: i32, storage_location: StorageLocation) -> Result<()> {
        let mut conn = self.db.get()?;
        dao::drawing::update_storage_location(&mut conn, id, &storage_location.to_string())?;
        self.notify_subscribers(&mut conn);
        Ok(())
    }

    /// Delete a record by id.
    pub async fn delete(&self, id: i32) -> Result<()> {
        let mut conn = self.db.get()?;
        dao::drawing::delete_drawing(&mut conn, id)?;
        self.notify_subscribers(&mut conn);
        Ok(())
    }

    /// Delete every record belonging to one owner.
    pub async fn delete_all_for_owner(&self, owner: &str) -> Result<usize> {
        let mut conn = self.db.get()?;
        let count = dao::drawing::delete_drawings_for_owner(&mut conn, owner)?;
        self.notify_subscribers(&mut conn);
        Ok(count)
    }

    // ========== Queries ==========

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Drawing>> {
        let mut conn = self.db.get()?;
        let record = dao::drawing::get_drawing_by_id(&mut conn, id)?;
        Ok(record.map(|r| r.into()))
    }

    /// Point lookup by file name; the most recent row wins should duplicates
    /// somehow exist.
    pub async fn find_by_name(&self, file_name: &str) -> Result<Option<Drawing>> {
        let mut conn = self.db.get()?;
        let record = dao::drawing::find_drawing_by_name(&mut conn, file_name)?;
        Ok(record.map(|r| r.into()))
    }

    pub async fn count_by_name(&self, file_name: &str) -> Result<i64> {
        let mut conn = self.db.get()?;
        dao::drawing::count_drawings_by_name(&mut conn, file_name)
    }

    /// Point-in-time read of the whole table.
    pub async fn snapshot_all(&self) -> Result<Vec<Drawing>> {
        let mut conn = self.db.get()?;
        let records = dao::drawing::get_all_drawings(&mut conn)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    // ========== Live query ==========

    /// Push the current table to all subscribers.
    fn notify_subscribers(&self, conn: &mut SqliteConnection) {
        match dao::drawing::get_all_drawings(conn) {
            Ok(records) => {
                let drawings: Vec<Drawing> = records.into_iter().map(|r| r.into()).collect();
                let _ = self.broadcaster.send(drawings);
            }
            Err(e) => warn!("Live query refresh failed: {}", e),
        }
    }
}
