//! # Storage Backends
//!
//! Unified read/write access to session inputs and outputs on the local
//! filesystem or Amazon S3, dispatched on the `s3://` path prefix. Remote
//! datasets are spooled to a temporary file before the NetCDF layer opens
//! them, since the dataset reader only works against local paths.
//!
//! AWS credentials come from the usual sources (environment variables,
//! credentials file, IAM role).

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 GetObject error: {0}")]
    S3Get(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::get_object::GetObjectError>),

    #[error("S3 PutObject error: {0}")]
    S3Put(#[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>),

    #[error("S3 body stream error: {0}")]
    ByteStream(String),

    #[error("Invalid S3 path, expected 's3://bucket/key': {0}")]
    InvalidS3Path(String),

    #[error("Path not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Interface shared by the storage backends
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the entire object at `path`.
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Writes `data` to `path`, creating parents as needed.
    async fn write(&self, path: &str, data: &[u8]) -> StoreResult<()>;
}

/// Local filesystem backend
#[derive(Debug, Clone)]
pub struct LocalObjects;

#[async_trait::async_trait]
impl ObjectStore for LocalObjects {
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }
}

/// Amazon S3 backend
#[derive(Debug, Clone)]
pub struct S3Objects {
    client: S3Client,
}

impl S3Objects {
    /// Builds a client from the default AWS configuration chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        S3Objects {
            client: S3Client::new(&config),
        }
    }

    fn split(path: &str) -> StoreResult<(String, String)> {
        let rest = path
            .strip_prefix("s3://")
            .ok_or_else(|| StoreError::InvalidS3Path(path.to_string()))?;
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok((bucket.to_string(), key.to_string()))
            }
            _ => Err(StoreError::InvalidS3Path(path.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Objects {
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let (bucket, key) = Self::split(path)?;
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                aws_sdk_s3::error::SdkError::ServiceError(service_err)
                    if service_err.err().is_no_such_key() =>
                {
                    StoreError::NotFound(path.to_string())
                }
                _ => StoreError::S3Get(e),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::ByteStream(e.to_string()))?
            .into_bytes()
            .to_vec();
        Ok(data)
    }

    async fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let (bucket, key) = Self::split(path)?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await?;
        Ok(())
    }
}

/// Backend selected from a path pattern
#[derive(Debug)]
pub enum Store {
    Local(LocalObjects),
    S3(S3Objects),
}

impl Store {
    /// Picks the backend for a path: `s3://` prefixes go to S3, everything
    /// else to the local filesystem.
    pub async fn for_path(path: &str) -> Store {
        if is_remote(path) {
            Store::S3(S3Objects::new().await)
        } else {
            Store::Local(LocalObjects)
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for Store {
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        match self {
            Store::Local(s) => s.read(path).await,
            Store::S3(s) => s.read(path).await,
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        match self {
            Store::Local(s) => s.write(path, data).await,
            Store::S3(s) => s.write(path, data).await,
        }
    }
}

/// Whether a path addresses a remote object rather than a local file.
pub fn is_remote(path: &str) -> bool {
    path.starts_with("s3://")
}

/// Resolves a dataset path to one the NetCDF layer can open.
///
/// Remote paths are downloaded to a named temporary file; the handle must
/// stay alive for as long as the local path is in use. Local paths pass
/// through unchanged.
pub async fn fetch_to_local(path: &str) -> StoreResult<(Option<NamedTempFile>, String)> {
    if !is_remote(path) {
        return Ok((None, path.to_string()));
    }
    let store = Store::for_path(path).await;
    let data = store.read(path).await?;
    let temp = NamedTempFile::new()?;
    fs::write(temp.path(), data).await?;
    let local = temp.path().to_string_lossy().to_string();
    Ok((Some(temp), local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_write_read_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let store = LocalObjects;
        let dir = TempDir::new()?;
        let path = dir.path().join("nested/session.json");
        let path_str = path.to_str().unwrap();

        store.write(path_str, b"{}").await?;
        assert_eq!(store.read(path_str).await?, b"{}");
        Ok(())
    }

    #[tokio::test]
    async fn test_local_read_not_found() {
        let store = LocalObjects;
        let result = store.read("/nonexistent/dataset.nc4").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_s3_path_split() {
        let (bucket, key) = S3Objects::split("s3://archive/g5nr/allVars_r90x45_3.nc4").unwrap();
        assert_eq!(bucket, "archive");
        assert_eq!(key, "g5nr/allVars_r90x45_3.nc4");

        assert!(S3Objects::split("https://archive/file.nc4").is_err());
        assert!(S3Objects::split("s3://").is_err());
        assert!(S3Objects::split("s3://bucket").is_err());
        assert!(S3Objects::split("s3:///file.nc4").is_err());
    }

    #[tokio::test]
    async fn test_fetch_to_local_passthrough() -> Result<(), Box<dyn std::error::Error>> {
        let (temp, local) = fetch_to_local("relative/dataset.nc4").await?;
        assert!(temp.is_none());
        assert_eq!(local, "relative/dataset.nc4");
        Ok(())
    }

    #[tokio::test]
    async fn test_store_dispatch_is_local_for_plain_paths() {
        assert!(!is_remote("/data/allVars.nc4"));
        assert!(is_remote("s3://bucket/allVars.nc4"));
        let store = Store::for_path("/data/allVars.nc4").await;
        assert!(matches!(store, Store::Local(_)));
    }
}
