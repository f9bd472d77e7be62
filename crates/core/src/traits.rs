//! ObjectStorageClient trait definition
//!
//! This trait defines the storage capabilities the session workflow needs.
//! It keeps the workflow decoupled from any specific S3 SDK.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::Result;
use crate::policy::AccessPolicy;

/// Metadata for an object or bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp (creation date for buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(
                size.max(0) as u64,
                humansize::BINARY,
            )),
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self {
            key: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
        }
    }
}

/// Readable object body
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// A downloaded object: metadata plus its body stream
pub struct ObjectContent {
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl ObjectContent {
    /// Wrap an in-memory buffer as an object body
    pub fn from_bytes(content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            content_type,
            body: Box::pin(Cursor::new(data)),
        }
    }
}

impl fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectContent")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Storage capabilities consumed by the session workflow
///
/// Implemented by the S3 adapter and by [`crate::MemoryStore`]; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// List buckets owned by the account, in provider order
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Fetch a bucket's ACL
    async fn get_bucket_access_policy(&self, bucket: &str) -> Result<AccessPolicy>;

    /// Replace a bucket's ACL
    async fn set_bucket_access_policy(&self, bucket: &str, policy: &AccessPolicy) -> Result<()>;

    /// Upload a local file as the object body
    async fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<ObjectInfo>;

    /// Fetch an object's ACL
    async fn get_object_access_policy(&self, bucket: &str, key: &str) -> Result<AccessPolicy>;

    /// Replace an object's ACL
    async fn set_object_access_policy(
        &self,
        bucket: &str,
        key: &str,
        policy: &AccessPolicy,
    ) -> Result<()>;

    /// Download an object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent>;

    /// List every object whose key starts with `prefix`
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Delete an object; deleting an absent key succeeds
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}
