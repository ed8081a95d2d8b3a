//! View projections - derived lists over the metadata store's live query
//!
//! Two continuously-updated projections: "mine, present locally" and
//! "available on server". Each subscriber filters the full table emission
//! independently; nothing is cached beyond the channel itself.

use crate::domain::drawing::Drawing;
use crate::error::Result;
use crate::infrastructure::storage::blob_store::BlobStore;
use crate::infrastructure::storage::metadata_store::MetadataStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Whether a record belongs in this user's local list.
///
/// Presence on disk is re-checked on every emission; a record whose blob was
/// removed out-of-band simply stops appearing.
pub fn is_local_to(drawing: &Drawing, username: &str) -> bool {
    drawing.storage_location.is_locally_present()
        && drawing.owner_username.as_deref() == Some(username)
        && BlobStore::exists(Path::new(&drawing.file_path), &drawing.file_name)
}

/// Whether a record belongs in the shared server list, any owner.
pub fn is_on_server(drawing: &Drawing) -> bool {
    drawing.storage_location.claims_server()
}

/// A filtered cursor over the live query.
pub struct ViewStream {
    rx: broadcast::Receiver<Vec<Drawing>>,
    filter: Box<dyn Fn(&Drawing) -> bool + Send + Sync>,
}

impl ViewStream {
    /// Wait for the next table emission and project it.
    ///
    /// Lagged emissions are skipped in favor of newer ones; `None` means the
    /// store is gone and no further emissions will come.
    pub async fn next(&mut self) -> Option<Vec<Drawing>> {
        loop {
            match self.rx.recv().await {
                Ok(all) => {
                    return Some(all.into_iter().filter(|d| (self.filter)(d)).collect());
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

pub struct DrawingViews {
    store: Arc<MetadataStore>,
}

impl DrawingViews {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }

    /// Point-in-time local list for one user.
    pub async fn local_view(&self, username: &str) -> Result<Vec<Drawing>> {
        let snapshot = self.store.snapshot_all().await?;
        Ok(snapshot
            .into_iter()
            .filter(|d| is_local_to(d, username))
            .collect())
    }

    /// Point-in-time shared list across all owners.
    pub async fn server_view(&self) -> Result<Vec<Drawing>> {
        let snapshot = self.store.snapshot_all().await?;
        Ok(snapshot.into_iter().filter(is_on_server).collect())
    }

    /// Reactive local list for one user.
    pub fn watch_local(&self, username: &str) -> ViewStream {
        let username = username.to_string();
        ViewStream {
            rx: self.store.subscribe(),
            filter: Box::new(move |d| is_local_to(d, &username)),
        }
    }

    /// Reactive shared list.
    pub fn watch_server(&self) -> ViewStream {
        ViewStream {
            rx: self.store.subscribe(),
            filter: Box::new(is_on_server),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drawing::StorageLocation;
    use crate::infrastructure::storage::db::pool::init_db_pool;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<MetadataStore>, DrawingViews) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = init_db_pool(db_path.to_str().unwrap()).unwrap();
        let store = Arc::new(MetadataStore::new(Arc::new(pool)));
        let views = DrawingViews::new(store.clone());
        (dir, store, views)
    }

    #[tokio::test]
    async fn test_local_view_requires_owner_and_blob() {
        let (dir, store, views) = setup();
        let blob_dir = dir.path().join("blobs");
        let dir_str = blob_dir.to_string_lossy().to_string();

        BlobStore::write(&blob_dir, "present", &Bytes::from_static(b"png"))
            .await
            .unwrap();
        store
            .insert("present", &dir_str, StorageLocation::Local, Some("alice"))
            .await
            .unwrap();
        // No blob on disk for this one
        store
            .insert("phantom", &dir_str, StorageLocation::Local, Some("alice"))
            .await
            .unwrap();
        // Different owner
        BlobStore::write(&blob_dir, "other", &Bytes::from_static(b"png"))
            .await
            .unwrap();
        store
            .insert("other", &dir_str, StorageLocation::Local, Some("bob"))
            .await
            .unwrap();

        let local = views.local_view("alice").await.unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].file_name, "present");
    }

    #[tokio::test]
    async fn test_server_view_spans_owners_and_skips_local_records() {
        let (_dir, store, views) = setup();

        store
            .insert("mine", "/tmp", StorageLocation::Both, Some("alice"))
            .await
            .unwrap();
        store
            .insert("theirs", "/tmp", StorageLocation::Server, Some("bob"))
            .await
            .unwrap();
        store
            .insert("draft", "/tmp", StorageLocation::Local, Some("alice"))
            .await
            .unwrap();
        store
            .insert("pending", "/tmp", StorageLocation::Uploading, Some("alice"))
            .await
            .unwrap();

        let server = views.server_view().await.unwrap();
        let names: Vec<&str> = server.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["mine", "theirs"]);
    }

    #[tokio::test]
    async fn test_ownerless_record_is_server_only() {
        let (dir, store, views) = setup();
        let blob_dir = dir.path().join("blobs");
        let dir_str = blob_dir.to_string_lossy().to_string();

        // Legacy rows may carry no owner; they stay visible on the shared
        // list but belong to nobody's local list.
        BlobStore::write(&blob_dir, "legacy", &Bytes::from_static(b"png"))
            .await
            .unwrap();
        store
            .insert("legacy", &dir_str, StorageLocation::Both, None)
            .await
            .unwrap();

        let server = views.server_view().await.unwrap();
        assert_eq!(server.len(), 1);
        assert_eq!(server[0].file_name, "legacy");
        assert!(views.local_view("alice").await.unwrap().is_empty());
        assert!(views.local_view("legacy").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watch_server_reflects_promotion() {
        let (_dir, store, views) = setup();
        let mut stream = views.watch_server();

        let drawing = store
            .insert("sketch", "/tmp", StorageLocation::Local, Some("alice"))
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().is_empty());

        store
            .set_location(drawing.id, StorageLocation::Both)
            .await
            .unwrap();
        let visible = stream.next().await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].file_name, "sketch");
    }

    #[tokio::test]
    async fn test_watch_local_sees_own_records_only() {
        let (dir, store, views) = setup();
        let blob_dir = dir.path().join("blobs");
        let dir_str = blob_dir.to_string_lossy().to_string();
        let mut stream = views.watch_local("alice");

        BlobStore::write(&blob_dir, "mine", &Bytes::from_static(b"png"))
            .await
            .unwrap();
        store
            .insert("mine", &dir_str, StorageLocation::Local, Some("alice"))
            .await
            .unwrap();
        let seen = stream.next().await.unwrap();
        assert_eq!(seen.len(), 1);

        store
            .insert("theirs", &dir_str, StorageLocation::Local, Some("bob"))
            .await
            .unwrap();
        let seen = stream.next().await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].file_name, "mine");
    }
}
