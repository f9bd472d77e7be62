//! ssd-s3: S3 SDK adapter for the storage session demo
//!
//! This crate provides the implementation of the ObjectStorageClient trait
//! using the aws-sdk-s3 crate. It is the only crate that directly
//! depends on the AWS SDK.

pub mod acl;
pub mod client;
mod error;

pub use client::S3Client;
