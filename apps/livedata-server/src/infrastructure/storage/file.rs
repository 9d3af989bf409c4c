//! File-backed subscription store.
//!
//! Persists the durable subscription set as a JSON document so it survives
//! process restarts. Writes go through a temporary file and an atomic
//! rename, so a crash mid-write leaves the previous document intact.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{PersistentSubscription, StorageError, SubscriptionStore};

/// JSON file implementation of [`SubscriptionStore`].
#[derive(Debug, Clone)]
pub struct FileSubscriptionStore {
    path: PathBuf,
}

impl FileSubscriptionStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn io_error(e: &std::io::Error) -> StorageError {
        StorageError::Io {
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl SubscriptionStore for FileSubscriptionStore {
    async fn read(&self) -> Result<BTreeSet<PersistentSubscription>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // A store that was never written is an empty set, not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(Self::io_error(&e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            message: e.to_string(),
        })
    }

    async fn write(
        &self,
        subscriptions: &BTreeSet<PersistentSubscription>,
    ) -> Result<(), StorageError> {
        let json =
            serde_json::to_vec_pretty(subscriptions).map_err(|e| StorageError::Corrupt {
                message: e.to_string(),
            })?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| Self::io_error(&e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Self::io_error(&e))
    }
}
