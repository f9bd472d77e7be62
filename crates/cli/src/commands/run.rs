//! run command - Execute the storage session
//!
//! Creates a uniquely named bucket, uploads a small text object, makes both
//! publicly readable, reads everything back and deletes it again.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ssd_core::{
    AliasManager, ConfigManager, Error, MemoryStore, ObjectStorageClient, Session,
    StorageDemoRunner, SystemTempFiles, config::Defaults,
};
use ssd_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Run the storage session
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Connect through a configured alias instead of the AWS default chain
    #[arg(long, conflicts_with = "offline")]
    pub alias: Option<String>,

    /// Region override for the AWS default chain
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Prefix for the generated bucket name
    #[arg(long)]
    pub bucket_prefix: Option<String>,

    /// Use this exact bucket name instead of generating one
    #[arg(long, conflicts_with = "bucket_prefix")]
    pub bucket: Option<String>,

    /// Key of the uploaded object
    #[arg(long)]
    pub key: Option<String>,

    /// Prefix used when listing objects
    #[arg(long)]
    pub prefix: Option<String>,

    /// Directory for the temporary payload file
    #[arg(long)]
    pub payload_dir: Option<PathBuf>,

    /// Line of text for the uploaded file; repeat for more lines
    #[arg(long = "line", value_name = "TEXT")]
    pub lines: Vec<String>,

    /// Run against an in-memory store instead of a real service
    #[arg(long)]
    pub offline: bool,
}

/// Execute the run command
pub async fn execute(args: RunArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let defaults = match ConfigManager::new().and_then(|cm| cm.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let session = match build_session(&args, &defaults) {
        Ok(s) => s,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let client = match build_client(&args, &defaults).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return e
                .downcast_ref::<Error>()
                .map(ExitCode::from)
                .unwrap_or(ExitCode::GeneralError);
        }
    };

    if args.offline {
        formatter.warning("Running against an in-memory store; nothing leaves this process");
    }

    let files = match &args.payload_dir {
        Some(dir) => SystemTempFiles::in_dir(dir),
        None => SystemTempFiles::new(),
    };
    let mut runner = StorageDemoRunner::new(client.as_ref(), &files);
    if !args.lines.is_empty() {
        runner = runner.with_payload_lines(args.lines);
    }

    // Session lines are the human output; JSON mode only prints the report
    let result = if formatter.is_json() || formatter.is_quiet() {
        runner.run(session, &mut std::io::sink()).await
    } else {
        runner.run(session, &mut std::io::stdout()).await
    };

    match result {
        Ok(report) => {
            if !report.is_completed() {
                tracing::info!(
                    bucket = %report.bucket,
                    completed = report.completed.len(),
                    "Session stopped early"
                );
            }
            formatter.run_report(&report);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Session failed: {e}"));
            ExitCode::from(&e)
        }
    }
}

fn build_session(args: &RunArgs, defaults: &Defaults) -> ssd_core::Result<Session> {
    let key = args.key.as_deref().unwrap_or(&defaults.object_key);
    let prefix = args.prefix.as_deref().unwrap_or(&defaults.list_prefix);

    match &args.bucket {
        Some(bucket) => Session::with_bucket(bucket, key, prefix),
        None => {
            let bucket_prefix = args
                .bucket_prefix
                .as_deref()
                .unwrap_or(&defaults.bucket_prefix);
            Session::generate(bucket_prefix, key, prefix)
        }
    }
}

async fn build_client(
    args: &RunArgs,
    defaults: &Defaults,
) -> anyhow::Result<Box<dyn ObjectStorageClient>> {
    if args.offline {
        return Ok(Box::new(MemoryStore::new()));
    }

    if let Some(name) = &args.alias {
        let alias = AliasManager::new()
            .and_then(|am| am.get(name))
            .with_context(|| format!("Failed to load alias '{name}'"))?;
        let client = S3Client::new(alias)
            .await
            .with_context(|| format!("Failed to create S3 client for alias '{name}'"))?;
        return Ok(Box::new(client));
    }

    let region = args.region.clone().or_else(|| defaults.region.clone());
    let client = S3Client::from_env(region)
        .await
        .context("Failed to create S3 client from the default credential chain")?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            alias: None,
            region: None,
            bucket_prefix: None,
            bucket: None,
            key: None,
            prefix: None,
            payload_dir: None,
            lines: Vec::new(),
            offline: true,
        }
    }

    #[test]
    fn test_build_session_uses_defaults() {
        let session = build_session(&args(), &Defaults::default()).unwrap();
        assert!(session.bucket.starts_with("ssd-demo-bucket-"));
        assert_eq!(session.key, "file_Object_Key");
        assert_eq!(session.list_prefix, "file_");
    }

    #[test]
    fn test_build_session_overrides() {
        let mut args = args();
        args.bucket = Some("fixed-bucket".into());
        args.key = Some("file_custom".into());
        args.prefix = Some("file_c".into());

        let session = build_session(&args, &Defaults::default()).unwrap();
        assert_eq!(session.bucket, "fixed-bucket");
        assert_eq!(session.key, "file_custom");
        assert_eq!(session.list_prefix, "file_c");
    }

    #[test]
    fn test_build_session_rejects_bad_bucket() {
        let mut args = args();
        args.bucket = Some("Bad_Bucket".into());
        let err = build_session(&args, &Defaults::default()).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_offline_client_is_memory_store() {
        let client = build_client(&args(), &Defaults::default()).await.unwrap();
        assert!(client.list_buckets().await.unwrap().is_empty());
    }
}
