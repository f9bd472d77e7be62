//! In-process object store
//!
//! `MemoryStore` implements [`ObjectStorageClient`] with S3-like semantics and
//! error codes. It backs `--offline` runs and the workflow tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{Error, Result, ServiceError};
use crate::payload::content_type_for;
use crate::policy::{AccessPolicy, Owner};
use crate::traits::{ObjectContent, ObjectInfo, ObjectStorageClient};

const OWNER_ID: &str = "memory-store-owner";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
    last_modified: Timestamp,
    acl: AccessPolicy,
}

#[derive(Debug)]
struct Bucket {
    name: String,
    created: Timestamp,
    acl: AccessPolicy,
    objects: BTreeMap<String, StoredObject>,
}

/// Object store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<Vec<Bucket>>,
    requests: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already owns `names`, in that order
    #[cfg(test)]
    pub(crate) fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut buckets = store.lock();
            for name in names {
                buckets.push(Bucket::new(name.into()));
            }
        }
        store
    }

    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.lock().iter().any(|b| b.name == bucket)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bucket>> {
        // A poisoned lock only means another caller panicked mid-request
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn request_id(&self) -> String {
        let n = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        format!("MEM{n:013X}")
    }

    fn rejected(&self, status: u16, code: &str, message: impl Into<String>) -> Error {
        ServiceError::new(message, Some(status))
            .with_code(code)
            .with_request_id(self.request_id())
            .into()
    }

    fn no_such_bucket(&self, bucket: &str) -> Error {
        self.rejected(
            404,
            "NoSuchBucket",
            format!("The specified bucket does not exist: {bucket}"),
        )
    }

    fn no_such_key(&self, key: &str) -> Error {
        self.rejected(
            404,
            "NoSuchKey",
            format!("The specified key does not exist: {key}"),
        )
    }
}

impl Bucket {
    fn new(name: String) -> Self {
        Self {
            name,
            created: Timestamp::now(),
            acl: AccessPolicy::private(default_owner()),
            objects: BTreeMap::new(),
        }
    }
}

fn default_owner() -> Owner {
    Owner {
        id: OWNER_ID.to_string(),
        display_name: Some("memory".to_string()),
    }
}

#[async_trait]
impl ObjectStorageClient for MemoryStore {
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.lock();
        if buckets.iter().any(|b| b.name == bucket) {
            return Err(self.rejected(
                409,
                "BucketAlreadyOwnedByYou",
                format!("Your previous request to create the named bucket succeeded and you already own it: {bucket}"),
            ));
        }
        buckets.push(Bucket::new(bucket.to_string()));
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let buckets = self.lock();
        let infos = buckets
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(&b.name);
                info.last_modified = Some(b.created);
                info
            })
            .collect();
        Ok(infos)
    }

    async fn get_bucket_access_policy(&self, bucket: &str) -> Result<AccessPolicy> {
        let buckets = self.lock();
        let acl = buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.acl.clone());
        acl.ok_or_else(|| self.no_such_bucket(bucket))
    }

    async fn set_bucket_access_policy(&self, bucket: &str, policy: &AccessPolicy) -> Result<()> {
        let mut buckets = self.lock();
        let updated = buckets
            .iter_mut()
            .find(|b| b.name == bucket)
            .map(|b| b.acl = policy.clone());
        updated.ok_or_else(|| self.no_such_bucket(bucket))
    }

    async fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<ObjectInfo> {
        if !self.bucket_exists(bucket) {
            return Err(self.no_such_bucket(bucket));
        }

        let data = tokio::fs::read(file).await?;
        let content_type = content_type_for(file);
        let now = Timestamp::now();

        let mut info = ObjectInfo::file(key, data.len() as i64);
        info.content_type = Some(content_type.clone());
        info.last_modified = Some(now);

        let mut buckets = self.lock();
        let Some(b) = buckets.iter_mut().find(|b| b.name == bucket) else {
            return Err(self.no_such_bucket(bucket));
        };
        b.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type,
                last_modified: now,
                acl: AccessPolicy::private(default_owner()),
            },
        );

        Ok(info)
    }

    async fn get_object_access_policy(&self, bucket: &str, key: &str) -> Result<AccessPolicy> {
        let buckets = self.lock();
        let found = buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.objects.get(key).map(|o| o.acl.clone()));
        match found {
            Some(Some(acl)) => Ok(acl),
            Some(None) => Err(self.no_such_key(key)),
            None => Err(self.no_such_bucket(bucket)),
        }
    }

    async fn set_object_access_policy(
        &self,
        bucket: &str,
        key: &str,
        policy: &AccessPolicy,
    ) -> Result<()> {
        let mut buckets = self.lock();
        let found = buckets
            .iter_mut()
            .find(|b| b.name == bucket)
            .map(|b| b.objects.get_mut(key).map(|o| o.acl = policy.clone()));
        match found {
            Some(Some(())) => Ok(()),
            Some(None) => Err(self.no_such_key(key)),
            None => Err(self.no_such_bucket(bucket)),
        }
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent> {
        let buckets = self.lock();
        let found = buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.objects.get(key).cloned());
        match found {
            Some(Some(obj)) => Ok(ObjectContent::from_bytes(Some(obj.content_type), obj.data)),
            Some(None) => Err(self.no_such_key(key)),
            None => Err(self.no_such_bucket(bucket)),
        }
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let buckets = self.lock();
        let listed = buckets.iter().find(|b| b.name == bucket).map(|b| {
            b.objects
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, o)| {
                    let mut info = ObjectInfo::file(k, o.data.len() as i64);
                    info.last_modified = Some(o.last_modified);
                    info
                })
                .collect::<Vec<_>>()
        });
        listed.ok_or_else(|| self.no_such_bucket(bucket))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.lock();
        let deleted = buckets.iter_mut().find(|b| b.name == bucket).map(|b| {
            b.objects.remove(key);
        });
        deleted.ok_or_else(|| self.no_such_bucket(bucket))
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut buckets = self.lock();
        let Some(pos) = buckets.iter().position(|b| b.name == bucket) else {
            return Err(self.no_such_bucket(bucket));
        };
        if !buckets[pos].objects.is_empty() {
            return Err(self.rejected(
                409,
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            ));
        }
        buckets.remove(pos);
        Ok(())
    }
}
