use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, PutPayload};

use crate::error::HrError;

#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
}

impl BlobStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// S3 bucket, with credentials and endpoint taken from the AWS environment.
    pub fn s3(bucket: &str, region: Option<&str>) -> Result<Self, HrError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        let store = builder.build().map_err(|e| HrError::Config {
            message: format!("invalid S3 configuration for bucket {bucket}: {e}"),
        })?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Directory on the local filesystem, created if missing.
    pub fn local(root: &Path) -> Result<Self, HrError> {
        std::fs::create_dir_all(root).map_err(|e| HrError::Config {
            message: format!("cannot create backup directory {}: {}", root.display(), e),
        })?;
        let absolute = root.canonicalize().map_err(|e| HrError::Config {
            message: format!("cannot resolve backup directory {}: {}", root.display(), e),
        })?;
        let store = LocalFileSystem::new_with_prefix(absolute).map_err(|e| HrError::Config {
            message: format!("cannot open backup directory {}: {}", root.display(), e),
        })?;
        Ok(Self::new(Arc::new(store)))
    }

    pub async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), HrError> {
        self.store
            .put(&ObjectPath::from(key), PutPayload::from(data))
            .await
            .map_err(|e| HrError::Storage {
                message: format!("failed to write {key}: {e}"),
            })?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, HrError> {
        let result = self
            .store
            .get(&ObjectPath::from(key))
            .await
            .map_err(|e| map_read_error(key, e))?;
        result.bytes().await.map_err(|e| map_read_error(key, e))
    }

    /// Write `data` only if nothing is stored under `key` yet.
    /// Returns `false`, leaving the stored object untouched, when the key is taken.
    pub async fn put_new(&self, key: &str, data: Bytes) -> Result<bool, HrError> {
        match self
            .store
            .put_opts(&ObjectPath::from(key), PutPayload::from(data), PutMode::Create.into())
            .await
        {
            Ok(_) => Ok(true),
            Err(object_store::Error::AlreadyExists { .. }) => Ok(false),
            Err(e) => Err(HrError::Storage {
                message: format!("failed to write {key}: {e}"),
            }),
        }
    }

    /// Keys under `prefix`, sorted ascending.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, HrError> {
        let prefix_path = ObjectPath::from(prefix.trim_end_matches('/'));
        let metas = self
            .store
            .list(Some(&prefix_path))
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| HrError::Storage {
                message: format!("failed to list {prefix}: {e}"),
            })?;
        let mut keys = metas
            .into_iter()
            .map(|m| m.location.to_string())
            .collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }
}

fn map_read_error(key: &str, err: object_store::Error) -> HrError {
    match err {
        object_store::Error::NotFound { .. } => {
            HrError::not_found(format!("backup not found: {key}"))
        }
        other => HrError::Storage {
            message: format!("failed to read {key}: {other}"),
        },
    }
}
