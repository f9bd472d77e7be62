//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStorageClient trait from ssd-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use ssd_core::payload::content_type_for;
use ssd_core::{AccessPolicy, Alias, Error, ObjectContent, ObjectInfo, ObjectStorageClient, Result};

use crate::acl;
use crate::error::classify;

/// Region that must not be sent as a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    region: Option<String>,
}

impl S3Client {
    /// Create a new S3 client from an alias configuration
    pub async fn new(alias: Alias) -> Result<Self> {
        alias.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            alias.access_key.clone(),
            alias.secret_key.clone(),
            None, // session token
            None, // expiry
            "ssd-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(alias.region.clone()))
            .endpoint_url(&alias.endpoint)
            .load()
            .await;

        // Path-style addressing for S3-compatible servers
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(alias.force_path_style())
            .build();

        tracing::debug!(alias = %alias.name, endpoint = %alias.endpoint, "Created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            region: Some(alias.region),
        })
    }

    /// Create a client from the AWS default provider chain
    ///
    /// Credentials and region come from the environment, shared config
    /// files or instance metadata. `region` overrides the resolved region.
    pub async fn from_env(region: Option<String>) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        let region = config.region().map(|r| r.to_string());

        tracing::debug!(region = ?region, "Created S3 client from default chain");

        Ok(Self {
            inner: aws_sdk_s3::Client::new(&config),
            region,
        })
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Location constraint to send with CreateBucket, if any
    fn bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        let region = self.region.as_deref().filter(|r| *r != DEFAULT_REGION)?;
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        )
    }
}

#[async_trait]
impl ObjectStorageClient for S3Client {
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.bucket_configuration())
            .send()
            .await
            .map_err(classify)?;

        tracing::debug!(bucket, region = ?self.region(), "Created bucket");
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self.inner.list_buckets().send().await.map_err(classify)?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                if let Some(creation_date) = b.creation_date() {
                    info.last_modified = jiff::Timestamp::from_second(creation_date.secs()).ok();
                }
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn get_bucket_access_policy(&self, bucket: &str) -> Result<AccessPolicy> {
        let response = self
            .inner
            .get_bucket_acl()
            .bucket(bucket)
            .send()
            .await
            .map_err(classify)?;

        Ok(acl::from_sdk(response.owner(), response.grants()))
    }

    async fn set_bucket_access_policy(&self, bucket: &str, policy: &AccessPolicy) -> Result<()> {
        self.inner
            .put_bucket_acl()
            .bucket(bucket)
            .access_control_policy(acl::to_sdk(policy)?)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, file: &Path) -> Result<ObjectInfo> {
        let size = tokio::fs::metadata(file).await?.len() as i64;
        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        let content_type = content_type_for(file);

        let response = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(&content_type)
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let mut info = ObjectInfo::file(key, size);
        if let Some(etag) = response.e_tag() {
            info.etag = Some(etag.trim_matches('"').to_string());
        }
        info.content_type = Some(content_type);
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn get_object_access_policy(&self, bucket: &str, key: &str) -> Result<AccessPolicy> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(acl::from_sdk(response.owner(), response.grants()))
    }

    async fn set_object_access_policy(
        &self,
        bucket: &str,
        key: &str,
        policy: &AccessPolicy,
    ) -> Result<()> {
        self.inner
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .access_control_policy(acl::to_sdk(policy)?)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(ObjectContent {
            content_type: response.content_type().map(str::to_string),
            body: Box::pin(response.body.into_async_read()),
        })
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut continuation_token = None;

        loop {
            let response = self
                .inner
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(classify)?;

            for object in response.contents() {
                let key = object.key().unwrap_or_default();
                let mut info = ObjectInfo::file(key, object.size().unwrap_or(0));

                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }

                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }

                items.push(info);
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(items)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_alias(region: &str) -> Alias {
        let mut alias = Alias::new("local", "http://127.0.0.1:9", "access", "secret");
        alias.region = region.to_string();
        alias
    }

    #[tokio::test]
    async fn test_new_from_alias_keeps_region() {
        let client = S3Client::new(local_alias("eu-central-1")).await.unwrap();
        assert_eq!(client.region(), Some("eu-central-1"));
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_endpoint() {
        let alias = Alias::new("bad", "not a url", "a", "b");
        assert!(S3Client::new(alias).await.is_err());
    }

    #[tokio::test]
    async fn test_location_constraint_outside_default_region() {
        let client = S3Client::new(local_alias("us-west-2")).await.unwrap();
        let config = client.bucket_configuration().unwrap();
        assert_eq!(
            config.location_constraint(),
            Some(&BucketLocationConstraint::UsWest2)
        );

        let client = S3Client::new(local_alias(DEFAULT_REGION)).await.unwrap();
        assert!(client.bucket_configuration().is_none());
    }

    #[tokio::test]
    async fn test_put_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = S3Client::new(local_alias(DEFAULT_REGION)).await.unwrap();
        let err = client
            .put_object("bucket", "key", &dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
