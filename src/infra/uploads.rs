//! Runtime upload storage and retrieval helpers.
//!
//! Uploaded images live in one flat directory and are addressed by URL
//! `/uploads/{filename}` where the filename is a random UUID plus the
//! original extension.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

/// URL path under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Errors that can occur while interacting with the upload storage backend.
#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result of storing an upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
}

/// Filesystem-backed upload storage.
#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the payload under a freshly generated name.
    pub async fn store(
        &self,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredUpload, UploadStorageError> {
        let filename = generated_filename(original_name);
        let absolute = self.resolve(&filename)?;

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(err.into());
        }
        file.flush().await?;

        Ok(StoredUpload {
            url: format!("{PUBLIC_PREFIX}{filename}"),
            size_bytes: data.len() as u64,
            filename,
        })
    }

    /// Attempt to read the stored payload into memory.
    pub async fn read(&self, filename: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(filename)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    /// Remove the stored payload. Missing files are treated as success.
    pub async fn delete(&self, filename: &str) -> Result<(), UploadStorageError> {
        let absolute = self.resolve(filename)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UploadStorageError::Io(err)),
        }
    }

    /// Filename behind a URL this storage produced, or `None` for anything
    /// else (external hosts, nested paths, traversal attempts).
    pub fn managed_filename<'a>(&self, url: &'a str) -> Option<&'a str> {
        let filename = url.strip_prefix(PUBLIC_PREFIX)?;
        is_plain_filename(filename).then_some(filename)
    }

    /// Resolve the absolute filesystem path for a stored upload.
    fn resolve(&self, filename: &str) -> Result<PathBuf, UploadStorageError> {
        if !is_plain_filename(filename) {
            return Err(UploadStorageError::InvalidPath);
        }
        Ok(self.root.join(filename))
    }
}

fn is_plain_filename(value: &str) -> bool {
    if value.is_empty() || value.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn generated_filename(original_name: &str) -> String {
    let identifier = Uuid::new_v4().simple();
    let extension = Path::new(original_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value.chars().all(|ch| ch.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{identifier}.{ext}"),
        None => identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, UploadStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().join("uploads")).expect("storage");
        (dir, storage)
    }

    #[tokio::test]
    async fn store_keeps_extension_and_builds_url() {
        let (_dir, storage) = storage();
        let stored = storage
            .store("Latte Art.JPG", Bytes::from_static(b"jpeg"))
            .await
            .expect("store");

        assert!(stored.filename.ends_with(".jpg"));
        assert_eq!(stored.filename.len(), 32 + 4);
        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));
        assert_eq!(stored.size_bytes, 4);

        let bytes = storage.read(&stored.filename).await.expect("read");
        assert_eq!(bytes, Bytes::from_static(b"jpeg"));
    }

    #[tokio::test]
    async fn filenames_are_unique() {
        let (_dir, storage) = storage();
        let first = storage
            .store("a.png", Bytes::from_static(b"1"))
            .await
            .expect("first");
        let second = storage
            .store("a.png", Bytes::from_static(b"2"))
            .await
            .expect("second");
        assert_ne!(first.filename, second.filename);
    }

    #[tokio::test]
    async fn odd_extensions_are_dropped() {
        let (_dir, storage) = storage();
        let stored = storage
            .store("photo.j p g", Bytes::from_static(b"x"))
            .await
            .expect("store");
        assert!(!stored.filename.contains('.'));
    }

    #[tokio::test]
    async fn empty_payload_is_stored() {
        let (_dir, storage) = storage();
        let stored = storage
            .store("blank.png", Bytes::new())
            .await
            .expect("store");

        assert_eq!(stored.size_bytes, 0);
        assert!(storage.read(&stored.filename).await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = storage();
        let stored = storage
            .store("a.png", Bytes::from_static(b"x"))
            .await
            .expect("store");

        storage.delete(&stored.filename).await.expect("first delete");
        storage.delete(&stored.filename).await.expect("second delete");
        assert!(!storage.root().join(&stored.filename).exists());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.read("../secret").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.delete("..").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }

    #[test]
    fn only_flat_upload_urls_are_managed() {
        let (_dir, storage) = storage();
        assert_eq!(
            storage.managed_filename("/uploads/abc.jpg"),
            Some("abc.jpg")
        );
        assert_eq!(storage.managed_filename("https://cdn.example.com/uploads/abc.jpg"), None);
        assert_eq!(storage.managed_filename("/static/abc.jpg"), None);
        assert_eq!(storage.managed_filename("/uploads/"), None);
        assert_eq!(storage.managed_filename("/uploads/../etc/passwd"), None);
        assert_eq!(storage.managed_filename("/uploads/.."), None);
        assert_eq!(storage.managed_filename("/uploads/nested/abc.jpg"), None);
    }
}
