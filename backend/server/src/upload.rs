//! Image upload widget shared by the catalog editors.
//!
//! One uploader tracks one image field: its preview and the stored object it
//! owns, plus a busy flag while a transfer runs. The registry keeps uploaders
//! alive between requests.
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::Utc;
use gateway::{GatewayError, ObjectStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::utils::storage_key;

pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Whether objects that no record points at anymore are removed from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    #[default]
    Keep,
    Delete,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(OrphanPolicy::Keep),
            "delete" => Ok(OrphanPolicy::Delete),
            other => Err(format!("expected keep or delete, got {other}")),
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrphanPolicy::Keep => "keep",
            OrphanPolicy::Delete => "delete",
        })
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Only image files can be uploaded, got {0}")]
    NotAnImage(String),

    #[error("Uploads to bucket {0} are not allowed")]
    UnknownBucket(String),

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("An upload is already in progress")]
    Busy,

    #[error("Storage refused the upload: {0}")]
    Storage(#[from] GatewayError),
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[derive(Debug, Default)]
struct Slot {
    preview: Option<String>,
    owned_key: Option<String>,
}

/// Held for the duration of a transfer; dropping it frees the widget.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ImageUploader {
    bucket: String,
    orphan_policy: OrphanPolicy,
    max_bytes: usize,
    busy: AtomicBool,
    slot: Mutex<Slot>,
}

impl ImageUploader {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            orphan_policy: OrphanPolicy::default(),
            max_bytes: DEFAULT_MAX_BYTES,
            busy: AtomicBool::new(false),
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn preview(&self) -> Option<String> {
        self.lock().preview.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks the widget busy, failing if a transfer is already in flight.
    pub(crate) fn begin(&self) -> Result<BusyGuard<'_>, UploadError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| UploadError::Busy)?;

        Ok(BusyGuard(&self.busy))
    }

    /// Points the widget at an image the record already has. When the URL
    /// lies in this uploader's bucket the object counts as owned, so a
    /// replacement under [`OrphanPolicy::Delete`] removes it. An empty URL
    /// resets the widget.
    pub fn set_current<S: ObjectStore>(&self, store: &S, url: &str) -> Result<(), UploadError> {
        let _busy = self.begin()?;

        let mut slot = self.lock();
        if url.is_empty() {
            *slot = Slot::default();
        } else {
            slot.preview = Some(url.to_string());
            slot.owned_key = object_key(store, &self.bucket, url);
        }

        Ok(())
    }

    /// Stores `file` under a fresh key and reports its public URL through
    /// `on_upload`. Nothing is written for non-images, and a failed transfer
    /// leaves the preview untouched.
    pub async fn upload<S, F>(
        &self,
        store: &S,
        file: UploadFile,
        on_upload: F,
    ) -> Result<String, UploadError>
    where
        S: ObjectStore,
        F: FnOnce(&str) + Send,
    {
        if !file.is_image() {
            return Err(UploadError::NotAnImage(file.content_type));
        }

        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let _busy = self.begin()?;

        let key = storage_key(
            &file.file_name,
            &file.content_type,
            Utc::now().timestamp_millis(),
        );
        let size = file.bytes.len();

        store
            .upload(&self.bucket, &key, &file.content_type, file.bytes)
            .await
            .inspect_err(|e| warn!(bucket = %self.bucket, error = %e, "Image upload failed"))?;

        let url = store.public_url(&self.bucket, &key);
        info!(bucket = %self.bucket, %key, size, "Image uploaded");

        let replaced = {
            let mut slot = self.lock();
            slot.preview = Some(url.clone());
            slot.owned_key.replace(key)
        };

        if let Some(previous) = replaced {
            self.discard(store, previous).await;
        }

        on_upload(&url);
        Ok(url)
    }

    /// Drops the preview and reports an empty URL. The stored object is only
    /// removed under [`OrphanPolicy::Delete`].
    pub async fn clear<S, F>(&self, store: &S, on_upload: F) -> Result<(), UploadError>
    where
        S: ObjectStore,
        F: FnOnce(&str) + Send,
    {
        let _busy = self.begin()?;

        let owned = {
            let mut slot = self.lock();
            slot.preview = None;
            slot.owned_key.take()
        };

        if let Some(key) = owned {
            self.discard(store, key).await;
        }

        on_upload("");
        Ok(())
    }

    async fn discard<S: ObjectStore>(&self, store: &S, key: String) {
        if self.orphan_policy == OrphanPolicy::Keep {
            return;
        }

        if let Err(e) = store.remove(&self.bucket, &[key]).await {
            warn!(bucket = %self.bucket, error = %e, "Could not remove replaced image");
        }
    }
}

type WidgetKey = (String, String, String);

/// Open upload widgets, one per staff member, bucket and form slot, so the
/// preview and busy flag live across requests.
pub struct UploadRegistry {
    orphan_policy: OrphanPolicy,
    max_bytes: usize,
    widgets: Mutex<HashMap<WidgetKey, Arc<ImageUploader>>>,
}

impl UploadRegistry {
    pub fn new(orphan_policy: OrphanPolicy, max_bytes: usize) -> Self {
        Self {
            orphan_policy,
            max_bytes,
            widgets: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WidgetKey, Arc<ImageUploader>>> {
        self.widgets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The widget for `slot`, opened empty on first use.
    pub fn widget(&self, user: &str, bucket: &str, slot: &str) -> Arc<ImageUploader> {
        let key = (user.to_string(), bucket.to_string(), slot.to_string());

        self.lock()
            .entry(key)
            .or_insert_with(|| {
                debug!(%user, %bucket, %slot, "Upload widget opened");
                Arc::new(
                    ImageUploader::new(bucket)
                        .with_orphan_policy(self.orphan_policy)
                        .with_max_bytes(self.max_bytes),
                )
            })
            .clone()
    }

    /// Closes every widget `user` had open. Returns how many were dropped.
    pub fn forget_user(&self, user: &str) -> usize {
        let mut widgets = self.lock();
        let before = widgets.len();
        widgets.retain(|(owner, _, _), _| owner != user);

        before - widgets.len()
    }
}

/// Key of `url` inside `bucket`, if the URL was issued by this store.
pub fn object_key<S: ObjectStore>(store: &S, bucket: &str, url: &str) -> Option<String> {
    let prefix = store.public_url(bucket, "");

    url.strip_prefix(&prefix)
        .filter(|key| !key.is_empty() && !key.contains('/'))
        .map(str::to_string)
}

/// Removes images that were linked from a record before an edit or delete
/// and are no longer linked after it. Best effort; failures are logged.
pub async fn discard_unlinked<S: ObjectStore>(
    store: &S,
    buckets: &[String],
    policy: OrphanPolicy,
    before: &[String],
    after: &[String],
) {
    if policy == OrphanPolicy::Keep {
        return;
    }

    for bucket in buckets {
        let keys: Vec<String> = before
            .iter()
            .filter(|url| !after.contains(url))
            .filter_map(|url| object_key(store, bucket, url))
            .collect();

        if keys.is_empty() {
            continue;
        }

        match store.remove(bucket, &keys).await {
            Ok(()) => info!(%bucket, count = keys.len(), "Removed unlinked images"),
            Err(e) => warn!(%bucket, error = %e, "Could not remove unlinked images"),
        }
    }
}
