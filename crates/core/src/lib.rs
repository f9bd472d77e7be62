//! ssd-core: Core library for the storage session demo
//!
//! This crate provides:
//! - The `ObjectStorageClient` trait the workflow runs against
//! - Access policies, sessions and the temporary upload payload
//! - `StorageDemoRunner`, the fixed bucket/object lifecycle
//! - Configuration and alias management
//! - An in-memory store for offline runs and tests
//!
//! Nothing here depends on a specific S3 SDK.

pub mod alias;
pub mod config;
pub mod error;
pub mod memory;
pub mod payload;
pub mod policy;
pub mod runner;
pub mod session;
pub mod traits;

pub use alias::{Alias, AliasManager, BucketLookup};
pub use config::{Config, ConfigManager};
pub use error::{Error, ErrorKind, ErrorType, Result, ServiceError};
pub use memory::MemoryStore;
pub use payload::{PayloadFile, SystemTempFiles, TempFileProvider};
pub use policy::{AccessPolicy, Grant, Grantee, Owner, Permission};
pub use runner::{ErrorReport, Outcome, RunReport, Step, StorageDemoRunner};
pub use session::Session;
pub use traits::{ByteStream, ObjectContent, ObjectInfo, ObjectStorageClient};
