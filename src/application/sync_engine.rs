//! Synchronization engine - High-level drawing lifecycle orchestration
//!
//! This service is the single entry point for every multi-step workflow:
//! create, rename, delete, upload, download, remote delete and the
//! fetch-and-reconcile sweep. Results propagate through the metadata store's
//! live query; callers rarely need the returned value beyond success/failure.

use crate::application::canvas::{CanvasService, DrawingContent};
use crate::domain::drawing::{Drawing, RemoteName, StorageLocation};
use crate::domain::identity::Identity;
use crate::error::{Result, SyncError};
use crate::infrastructure::network::api_client::DrawingApi;
use crate::infrastructure::storage::blob_store::BlobStore;
use crate::infrastructure::storage::metadata_store::MetadataStore;
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per record id.
///
/// Mutating workflows take the record's lock before re-reading its row, so
/// rename/delete/upload issued in quick succession against the same record
/// run one after another while unrelated records proceed in parallel.
struct RecordLocks {
    inner: AsyncMutex<HashMap<i32, Arc<AsyncMutex<()>>>>,
}

impl RecordLocks {
    fn new() -> Self {
        Self {
            inner: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn lock(&self, id: i32) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Drop the entry for a deleted record. Ids are never reused, so a late
    /// waiter getting a fresh mutex is harmless.
    async fn discard(&self, id: i32) {
        self.inner.lock().await.remove(&id);
    }
}

/// High-level synchronization service over the three stores.
///
/// # Responsibilities
/// - Drawing lifecycle (create, rename, save, load, delete)
/// - Storage location transitions, including the transient `Uploading` state
/// - Remote publication and removal under an explicit identity
/// - Reconciliation of local claims against the server's authoritative list
///
/// Cloning is cheap; all state is shared behind `Arc`.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<MetadataStore>,
    api: Arc<dyn DrawingApi>,
    locks: Arc<RecordLocks>,
    data_dir: PathBuf,
    canvas_size: u32,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("data_dir", &self.data_dir)
            .field("canvas_size", &self.canvas_size)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(
        store: Arc<MetadataStore>,
        api: Arc<dyn DrawingApi>,
        data_dir: PathBuf,
        canvas_size: u32,
    ) -> Self {
        Self {
            store,
            api,
            locks: Arc::new(RecordLocks::new()),
            data_dir,
            canvas_size,
        }
    }

    /// The metadata store backing this engine; view projections subscribe
    /// to its live query.
    pub fn metadata_store(&self) -> Arc<MetadataStore> {
        self.store.clone()
    }

    // ========== Local Lifecycle ==========

    /// Create a new drawing with a blank canvas.
    ///
    /// The record is inserted first so the metadata store's uniqueness
    /// constraint decides name ownership; only then is the blob written.
    /// A second create with the same name fails with `Conflict` and never
    /// touches the first drawing's bytes.
    pub async fn create_drawing(&self, file_name: &str, identity: &Identity) -> Result<Drawing> {
        let blank = CanvasService::blank_canvas(self.canvas_size)?;
        let dir = self.data_dir.to_string_lossy();
        let drawing = self
            .store
            .insert(
                file_name,
                dir.as_ref(),
                StorageLocation::Local,
                Some(&identity.username),
            )
            .await?;

        if let Err(e) = BlobStore::write(&self.data_dir, file_name, &blank).await {
            // No blob means no drawing; take the reserved name back.
            if let Err(cleanup) = self.store.delete(drawing.id).await {
                error!("Failed to remove record after blob write error: {}", cleanup);
            }
            return Err(e);
        }
        info!("Created drawing {} for {}", file_name, identity.username);
        Ok(drawing)
    }

    /// Rename a drawing's blob and record as a unit.
    ///
    /// Returns `false` when the source blob is missing, the target name is
    /// taken, or any step fails; on a rejected metadata update the blob is
    /// renamed back so disk and metadata stay in step.
    pub async fn rename_drawing(&self, drawing: &Drawing, new_name: &str) -> bool {
        let _guard = self.locks.lock(drawing.id).await;
        let fresh = match self.store.get_by_id(drawing.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                warn!("Rename failed, record missing: {}", drawing.file_name);
                return false;
            }
            Err(e) => {
                error!("Rename failed reading {}: {}", drawing.file_name, e);
                return false;
            }
        };

        let dir = PathBuf::from(&fresh.file_path);
        if !BlobStore::exists(&dir, &fresh.file_name) {
            warn!("Rename failed, no blob for {}", fresh.file_name);
            return false;
        }
        match BlobStore::rename(&dir, &fresh.file_name, new_name).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Rename failed, {} -> {} not possible", fresh.file_name, new_name);
                return false;
            }
            Err(e) => {
                error!("Rename failed for {}: {}", fresh.file_name, e);
                return false;
            }
        }

        let mut renamed = fresh.clone();
        renamed.file_name = new_name.to_string();
        match self.store.update(&renamed).await {
            Ok(()) => {
                info!("Renamed drawing {} -> {}", fresh.file_name, new_name);
                true
            }
            Err(e) => {
                warn!("Rename rejected for {} -> {}: {}", fresh.file_name, new_name, e);
                if let Err(undo) = BlobStore::rename(&dir, new_name, &fresh.file_name).await {
                    error!("Failed to restore blob name {}: {}", fresh.file_name, undo);
                }
                false
            }
        }
    }

    /// Overwrite a drawing's canvas bytes; the record itself is unchanged.
    pub async fn save_drawing(&self, drawing: &Drawing, bytes: &[u8]) -> Result<()> {
        let _guard = self.locks.lock(drawing.id).await;
        let fresh = self
            .store
            .get_by_id(drawing.id)
            .await?
            .ok_or_else(|| SyncError::not_found(drawing.file_name.clone()))?;
        let png = CanvasService::ensure_png(bytes)?;
        BlobStore::write(Path::new(&fresh.file_path), &fresh.file_name, &png).await?;
        Ok(())
    }

    /// Read a drawing's canvas back; `None` when no local blob exists.
    pub async fn load_drawing(&self, drawing: &Drawing) -> Result<Option<DrawingContent>> {
        let dir = Path::new(&drawing.file_path);
        match BlobStore::read(dir, &drawing.file_name).await? {
            Some(bytes) => Ok(Some(CanvasService::content_from_bytes(bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete the local copy of a drawing.
    ///
    /// A record that also lives on the server keeps its row and is demoted to
    /// `Server`; when the deleting identity owns it and carries a credential,
    /// the remote copy is removed as well, fire-and-forget. The demotion is
    /// not rolled back if that remote call later fails.
    pub async fn delete_drawing(&self, drawing: &Drawing, identity: &Identity) -> Result<()> {
        let guard = self.locks.lock(drawing.id).await;
        let fresh = self
            .store
            .get_by_id(drawing.id)
            .await?
            .ok_or_else(|| SyncError::not_found(drawing.file_name.clone()))?;
        let dir = PathBuf::from(&fresh.file_path);

        if fresh.storage_location == StorageLocation::Both {
            if let Err(e) = BlobStore::delete(&dir, &fresh.file_name).await {
                warn!("Failed to delete file, but continuing: {}", e);
            }
            self.store
                .set_location(fresh.id, StorageLocation::Server)
                .await?;
            drop(guard);

            if identity.owns(&fresh) && identity.bearer().is_some() {
                let mut demoted = fresh.clone();
                demoted.storage_location = StorageLocation::Server;
                let engine = self.clone();
                let identity = identity.clone();
                tokio::spawn(async move {
                    if let Err(e) = engine.delete_remote(&demoted, &identity).await {
                        warn!(
                            "Remote delete after local delete failed for {}: {}",
                            demoted.file_name, e
                        );
                    }
                });
            }
            return Ok(());
        }

        if let Err(e) = BlobStore::delete(&dir, &fresh.file_name).await {
            warn!("Failed to delete file, but continuing: {}", e);
        }
        self.store.delete(fresh.id).await?;
        self.locks.discard(fresh.id).await;
        info!("Deleted drawing {}", fresh.file_name);
        Ok(())
    }

    // ========== Remote Publication ==========

    /// Publish a drawing's local blob to the server.
    ///
    /// The record moves through the visible `Uploading` state and is only
    /// promoted to `Both` once the server has accepted the bytes; on failure
    /// it returns to where it was.
    pub async fn upload_file(&self, drawing: &Drawing, identity: &Identity) -> Result<()> {
        let _guard = self.locks.lock(drawing.id).await;
        let fresh = self
            .store
            .get_by_id(drawing.id)
            .await?
            .ok_or_else(|| SyncError::not_found(drawing.file_name.clone()))?;
        let dir = PathBuf::from(&fresh.file_path);
        let bytes = BlobStore::read(&dir, &fresh.file_name)
            .await?
            .ok_or_else(|| {
                SyncError::not_found(format!("no local copy of {}", fresh.file_name))
            })?;

        let previous = fresh.storage_location;
        self.store
            .set_location(fresh.id, StorageLocation::Uploading)
            .await?;

        let remote = fresh.remote_name();
        let token = identity.token.clone();
        let outcome = async {
            let png = CanvasService::ensure_png(&bytes)?;
            self.api.upload(&remote.owner, &remote.name, png, token).await
        }
        .await;

        match outcome {
            Ok(()) => {
                self.store
                    .set_location(fresh.id, StorageLocation::Both)
                    .await?;
                info!("Uploaded drawing {}", remote);
                Ok(())
            }
            Err(e) => {
                error!("Upload failed for {}: {}", remote, e);
                if let Err(rollback) = self.store.set_location(fresh.id, previous).await {
                    error!("Failed to restore location for {}: {}", remote.name, rollback);
                }
                Err(e)
            }
        }
    }

    /// Fetch a remote drawing into the local store.
    ///
    /// The local copy is attributed to the original uploader; the location
    /// becomes `Both` for the owner and `Server` for any other viewer.
    pub async fn download_file(
        &self,
        owner: &str,
        file_name: &str,
        identity: &Identity,
    ) -> Result<Drawing> {
        let bytes = self.api.download(owner, file_name).await?;
        let content = CanvasService::content_from_bytes(bytes)?;
        debug!(
            "Downloaded {}/{} ({}x{})",
            owner, file_name, content.width, content.height
        );
        BlobStore::write(&self.data_dir, file_name, &content.bytes).await?;

        let location = if identity.username == owner {
            StorageLocation::Both
        } else {
            StorageLocation::Server
        };
        let dir = self.data_dir.to_string_lossy();
        match self
            .store
            .insert(file_name, dir.as_ref(), location, Some(owner))
            .await
        {
            Ok(drawing) => Ok(drawing),
            Err(SyncError::Conflict(_)) => {
                // Already known locally; refresh the existing row instead.
                // The conflicting row carries this owner, never a namesake
                // belonging to someone else.
                if let Some(existing) = self.store.find_by_name(file_name).await? {
                    if existing.owner_username.as_deref() == Some(owner) {
                        let _guard = self.locks.lock(existing.id).await;
                        if let Some(mut fresh) = self.store.get_by_id(existing.id).await? {
                            self.store.set_location(fresh.id, location).await?;
                            fresh.storage_location = location;
                            return Ok(fresh);
                        }
                    }
                }
                Err(SyncError::inconsistency(format!(
                    "record for {} vanished during download",
                    file_name
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a drawing from the server, then locally.
    ///
    /// Only the owner with a valid credential may do this; the server enforces
    /// the same rule. A reconcile runs afterwards to refresh derived views.
    pub async fn delete_remote(&self, drawing: &Drawing, identity: &Identity) -> Result<()> {
        if !identity.owns(drawing) {
            return Err(SyncError::unauthorized(format!(
                "{} does not own {}",
                identity.username, drawing.file_name
            )));
        }
        let token = identity
            .bearer()
            .ok_or_else(|| SyncError::unauthorized("missing credential"))?;

        {
            let _guard = self.locks.lock(drawing.id).await;
            let fresh = self
                .store
                .get_by_id(drawing.id)
                .await?
                .ok_or_else(|| SyncError::not_found(drawing.file_name.clone()))?;
            let remote = fresh.remote_name();
            self.api.delete(&remote.owner, &remote.name, token).await?;

            if let Err(e) =
                BlobStore::delete(Path::new(&fresh.file_path), &fresh.file_name).await
            {
                warn!("Failed to delete file, but continuing: {}", e);
            }
            self.store.delete(fresh.id).await?;
            self.locks.discard(fresh.id).await;
            info!("Removed remote drawing {}", remote);
        }

        if let Err(e) = self.fetch_and_reconcile(identity).await {
            warn!("Reconcile after remote delete failed: {}", e);
        }
        Ok(())
    }

    // ========== Reconciliation ==========

    /// Reconcile local claims about the server against its authoritative list.
    ///
    /// Two sweeps over the `owner/file_name` inventory:
    /// 1. records claiming server presence whose name is gone are removed,
    /// 2. names with no local record at all are downloaded and inserted.
    ///
    /// The sweep is not transactional; an interrupted run converges on the
    /// next call. Records mid-upload claim no server presence yet and are
    /// left alone.
    pub async fn fetch_and_reconcile(&self, identity: &Identity) -> Result<()> {
        let names = self.api.list_names().await?;
        let remote_set: HashSet<RemoteName> =
            names.iter().map(|entry| RemoteName::parse(entry)).collect();

        let mut removed = 0usize;
        for record in self.store.snapshot_all().await? {
            if !Self::is_stale(&record, &remote_set) {
                continue;
            }
            let _guard = self.locks.lock(record.id).await;
            let fresh = match self.store.get_by_id(record.id).await? {
                Some(fresh) => fresh,
                None => continue,
            };
            if !Self::is_stale(&fresh, &remote_set) {
                continue;
            }
            if let Err(e) =
                BlobStore::delete(Path::new(&fresh.file_path), &fresh.file_name).await
            {
                warn!("Failed to delete file, but continuing: {}", e);
            }
            self.store.delete(fresh.id).await?;
            self.locks.discard(fresh.id).await;
            removed += 1;
        }

        let mut missing = Vec::new();
        for remote in &remote_set {
            if self.store.count_by_name(&remote.name).await? == 0 {
                missing.push(remote.clone());
            }
        }
        let attempted = missing.len();

        let mut tasks = Vec::new();
        for remote in missing {
            let engine = self.clone();
            let identity = identity.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = engine
                    .download_file(&remote.owner, &remote.name, &identity)
                    .await
                {
                    warn!("Reconcile download failed for {}: {}", remote, e);
                }
            }));
        }
        for task in tasks {
            let _ = task.await;
        }

        info!(
            "Reconcile done: {} stale records removed, {} downloads attempted",
            removed, attempted
        );
        Ok(())
    }

    /// A record is stale when it claims server presence the server denies.
    ///
    /// The listing is compared in parsed form, so a slashless entry and the
    /// `unknown`-owner record it produced refer to the same name.
    fn is_stale(record: &Drawing, remote_set: &HashSet<RemoteName>) -> bool {
        record.storage_location.claims_server() && !remote_set.contains(&record.remote_name())
    }

    // ========== Bulk Operations ==========

    /// Remove every drawing owned by this identity, blobs included.
    pub async fn delete_all(&self, identity: &Identity) -> Result<usize> {
        let snapshot = self.store.snapshot_all().await?;
        for record in snapshot.iter().filter(|r| identity.owns(r)) {
            if let Err(e) =
                BlobStore::delete(Path::new(&record.file_path), &record.file_name).await
            {
                warn!("Failed to delete file: {}, continuing", e);
            }
        }
        let removed = self.store.delete_all_for_owner(&identity.username).await?;
        info!("Removed {} drawings for {}", removed, identity.username);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::api_client::MockDrawingApi;
    use crate::infrastructure::storage::db::pool::init_db_pool;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn build_engine(dir: &TempDir, api: MockDrawingApi) -> SyncEngine {
        let db_path = dir.path().join("test.db");
        let pool = init_db_pool(db_path.to_str().unwrap()).unwrap();
        let store = Arc::new(MetadataStore::new(Arc::new(pool)));
        SyncEngine::new(store, Arc::new(api), dir.path().join("blobs"), 16)
    }

    #[tokio::test]
    async fn test_create_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let engine = build_engine(&dir, MockDrawingApi::new());
        let alice = Identity::local_only("alice");

        let drawing = engine.create_drawing("sketch", &alice).await.unwrap();
        assert_eq!(drawing.storage_location, StorageLocation::Local);

        let content = engine.load_drawing(&drawing).await.unwrap().unwrap();
        assert_eq!((content.width, content.height), (16, 16));
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let dir = TempDir::new().unwrap();
        let engine = build_engine(&dir, MockDrawingApi::new());
        let alice = Identity::local_only("alice");

        engine.create_drawing("sketch", &alice).await.unwrap();
        let err = engine.create_drawing("sketch", &alice).await.unwrap_err();
        assert!(matches!(err, SyncError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_remote_rejects_non_owner_without_network_call() {
        let dir = TempDir::new().unwrap();
        let mut api = MockDrawingApi::new();
        api.expect_delete().times(0);
        let engine = build_engine(&dir, api);

        let alice = Identity::new("alice", "t0k3n");
        let drawing = engine.create_drawing("sketch", &alice).await.unwrap();

        let bob = Identity::new("bob", "other");
        let err = engine.delete_remote(&drawing, &bob).await.unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized(_)));

        let err = engine
            .delete_remote(&drawing, &Identity::local_only("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_record_locks_serialize_same_id() {
        let locks = Arc::new(RecordLocks::new());
        let order = Arc::new(StdMutex::new(Vec::new()));

        let first = {
            let locks = locks.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
                order.lock().unwrap().push("first-in");
                tokio::time::sleep(Duration::from_millis(50)).await;
                order.lock().unwrap().push("first-out");
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let locks = locks.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
                order.lock().unwrap().push("second-in");
            })
        };

        first.await.unwrap();
        second.await.unwrap();
        let seen = order.lock().unwrap().clone();
        assert_eq!(seen, vec!["first-in", "first-out", "second-in"]);
    }
}
