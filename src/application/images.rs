//! Image lifecycle for entities that own an ordered list of image URLs.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::images::{is_image_content_type, plan_images};
use crate::infra::uploads::{UploadStorage, UploadStorageError};

/// Upper bound for a single uploaded image.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A file received from a client, not yet written to storage.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("`{filename}` is not an image (content type `{content_type}`)")]
    NotAnImage {
        filename: String,
        content_type: String,
    },
    #[error("`{filename}` is {size} bytes, above the {limit} byte limit")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },
    #[error("failed to store image")]
    Store(#[source] UploadStorageError),
    #[error("failed to delete replaced image `{url}`")]
    Delete {
        url: String,
        #[source]
        source: UploadStorageError,
    },
}

/// Image list to persist after a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledImages {
    pub urls: Vec<String>,
    /// Files written for this request; discard them if the entity write fails.
    pub stored: Vec<String>,
    /// Managed files deleted because they dropped out of the list.
    pub deleted: Vec<String>,
}

#[derive(Clone)]
pub struct ImageReconciler {
    storage: Arc<UploadStorage>,
    max_bytes: u64,
}

impl ImageReconciler {
    pub fn new(storage: Arc<UploadStorage>, max_bytes: u64) -> Self {
        Self { storage, max_bytes }
    }

    /// Check every upload before anything touches the disk.
    pub fn validate(&self, uploads: &[ImageUpload]) -> Result<(), ImageError> {
        for upload in uploads {
            if !is_image_content_type(&upload.content_type) {
                return Err(ImageError::NotAnImage {
                    filename: upload.filename.clone(),
                    content_type: upload.content_type.clone(),
                });
            }
            let size = upload.data.len() as u64;
            if size > self.max_bytes {
                return Err(ImageError::TooLarge {
                    filename: upload.filename.clone(),
                    size,
                    limit: self.max_bytes,
                });
            }
        }
        Ok(())
    }

    /// Validate and store `uploads`, diff the merged list against `previous`
    /// and delete the managed files that are no longer referenced.
    ///
    /// A failed deletion aborts before the caller persists anything, and the
    /// files stored by this call are removed again.
    pub async fn reconcile(
        &self,
        previous: &[String],
        kept: Vec<String>,
        uploads: Vec<ImageUpload>,
    ) -> Result<ReconciledImages, ImageError> {
        self.validate(&uploads)?;
        let stored = self.store_all(uploads).await?;

        let plan = plan_images(previous, kept, stored.clone());
        let mut deleted = Vec::new();
        for url in &plan.removed {
            let Some(filename) = self.storage.managed_filename(url) else {
                debug!(url = %url, "Leaving unmanaged image URL untouched");
                continue;
            };
            if let Err(source) = self.storage.delete(filename).await {
                self.discard(&stored).await;
                return Err(ImageError::Delete {
                    url: url.clone(),
                    source,
                });
            }
            deleted.push(url.clone());
        }

        Ok(ReconciledImages {
            urls: plan.urls,
            stored,
            deleted,
        })
    }

    /// Delete every managed file in `urls`, stopping at the first I/O failure.
    pub async fn remove_all(&self, urls: &[String]) -> Result<(), ImageError> {
        for url in urls {
            let Some(filename) = self.storage.managed_filename(url) else {
                continue;
            };
            self.storage
                .delete(filename)
                .await
                .map_err(|source| ImageError::Delete {
                    url: url.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Best-effort removal of files written by a request that later failed.
    pub async fn discard(&self, urls: &[String]) {
        for url in urls {
            let Some(filename) = self.storage.managed_filename(url) else {
                continue;
            };
            if let Err(err) = self.storage.delete(filename).await {
                warn!(url = %url, error = %err, "Failed to discard orphaned upload");
            }
        }
    }

    async fn store_all(&self, uploads: Vec<ImageUpload>) -> Result<Vec<String>, ImageError> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.storage.store(&upload.filename, upload.data).await {
                Ok(saved) => stored.push(saved.url),
                Err(err) => {
                    self.discard(&stored).await;
                    return Err(ImageError::Store(err));
                }
            }
        }
        Ok(stored)
    }
}
