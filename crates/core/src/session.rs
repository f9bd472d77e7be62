//! Per-run session state
//!
//! A [`Session`] carries the values threaded through the workflow: the
//! generated bucket name, the object key, the listing prefix, the payload file
//! once it exists and the public-read policy built for the bucket.

use crate::error::{Error, Result};
use crate::payload::PayloadFile;
use crate::policy::AccessPolicy;

/// Default prefix for generated bucket names
pub const DEFAULT_BUCKET_PREFIX: &str = "ssd-demo-bucket";

/// Default object key
pub const DEFAULT_OBJECT_KEY: &str = "file_Object_Key";

/// Default prefix used when listing objects
pub const DEFAULT_LIST_PREFIX: &str = "file_";

/// State for a single run
#[derive(Debug)]
pub struct Session {
    pub bucket: String,
    pub key: String,
    pub list_prefix: String,
    /// Set by the payload step; dropping it deletes the file
    pub payload: Option<PayloadFile>,
    /// Set by the bucket ACL step, reused for the object
    pub public_policy: Option<AccessPolicy>,
}

impl Session {
    /// Start a session with a freshly generated bucket name
    pub fn generate(
        bucket_prefix: &str,
        key: impl Into<String>,
        list_prefix: impl Into<String>,
    ) -> Result<Self> {
        Self::with_bucket(generate_bucket_name(bucket_prefix)?, key, list_prefix)
    }

    /// Start a session against an explicit bucket name
    pub fn with_bucket(
        bucket: impl Into<String>,
        key: impl Into<String>,
        list_prefix: impl Into<String>,
    ) -> Result<Self> {
        let bucket = bucket.into();
        validate_bucket_name(&bucket)?;
        let key = key.into();
        if key.is_empty() {
            return Err(Error::Config("Object key cannot be empty".into()));
        }
        Ok(Self {
            bucket,
            key,
            list_prefix: list_prefix.into(),
            payload: None,
            public_policy: None,
        })
    }
}

/// Build `<prefix>-<uuid>` and check it is a legal bucket name
pub fn generate_bucket_name(prefix: &str) -> Result<String> {
    let prefix = prefix.trim_end_matches('-').to_ascii_lowercase();
    let name = if prefix.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    };
    validate_bucket_name(&name)?;
    Ok(name)
}

/// Basic S3 bucket naming rules
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.len() < 3 || name.len() > 63 {
        return Err(Error::InvalidBucketName(format!(
            "'{name}' must be between 3 and 63 characters"
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(Error::InvalidBucketName(format!(
            "'{name}' may only contain lowercase letters, digits, '-' and '.'"
        )));
    }

    let first = name.chars().next();
    let last = name.chars().last();
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !alnum(first) || !alnum(last) {
        return Err(Error::InvalidBucketName(format!(
            "'{name}' must start and end with a letter or digit"
        )));
    }

    if name.contains("..") {
        return Err(Error::InvalidBucketName(format!(
            "'{name}' must not contain consecutive periods"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_are_unique() {
        let a = generate_bucket_name(DEFAULT_BUCKET_PREFIX).unwrap();
        let b = generate_bucket_name(DEFAULT_BUCKET_PREFIX).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("ssd-demo-bucket-"));
    }

    #[test]
    fn test_generated_name_lowercases_prefix() {
        let name = generate_bucket_name("My-Demo-").unwrap();
        assert!(name.starts_with("my-demo-"));
        assert!(!name.contains("--"));
    }

    #[test]
    fn test_generated_name_too_long() {
        let prefix = "a".repeat(40);
        assert!(matches!(
            generate_bucket_name(&prefix),
            Err(Error::InvalidBucketName(_))
        ));
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("my-bucket").is_ok());
        assert!(validate_bucket_name("logs.2024").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("MyBucket").is_err());
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
        assert!(validate_bucket_name("a..b").is_err());
        assert!(validate_bucket_name("under_score").is_err());
    }

    #[test]
    fn test_session_defaults() {
        let session = Session::generate(
            DEFAULT_BUCKET_PREFIX,
            DEFAULT_OBJECT_KEY,
            DEFAULT_LIST_PREFIX,
        )
        .unwrap();
        assert_eq!(session.key, "file_Object_Key");
        assert_eq!(session.list_prefix, "file_");
        assert!(session.payload.is_none());
        assert!(session.public_policy.is_none());
    }

    #[test]
    fn test_session_rejects_empty_key() {
        assert!(Session::with_bucket("my-bucket", "", "file_").is_err());
    }
}
