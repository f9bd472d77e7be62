//! The storage session workflow
//!
//! [`StorageDemoRunner`] walks the fixed [`Step::SEQUENCE`] once against an
//! [`ObjectStorageClient`], writing progress lines to a caller-supplied sink.
//! The first failing step ends the run. Service and client failures are
//! written out as a diagnostic report and the run still returns `Ok`; any
//! other failure is returned to the caller. Nothing created before the
//! failure is cleaned up on the service side.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::error::{Error, ErrorKind, ErrorType, Result};
use crate::payload::{PAYLOAD_LINES, PayloadFile, TempFileProvider};
use crate::policy::{Grantee, Permission};
use crate::session::Session;
use crate::traits::ObjectStorageClient;

const BANNER_RULE: &str = "===========================================";
const BANNER_TITLE: &str = "Getting Started with S3";

/// One operation of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateBucket,
    ListBuckets,
    SetBucketPolicy,
    CreatePayload,
    PutObject,
    SetObjectPolicy,
    GetObject,
    ListObjects,
    DeleteObject,
    DeleteBucket,
}

impl Step {
    /// Execution order. The object is always deleted before its bucket.
    pub const SEQUENCE: [Step; 10] = [
        Step::CreateBucket,
        Step::ListBuckets,
        Step::SetBucketPolicy,
        Step::CreatePayload,
        Step::PutObject,
        Step::SetObjectPolicy,
        Step::GetObject,
        Step::ListObjects,
        Step::DeleteObject,
        Step::DeleteBucket,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateBucket => "create_bucket",
            Step::ListBuckets => "list_buckets",
            Step::SetBucketPolicy => "set_bucket_policy",
            Step::CreatePayload => "create_payload",
            Step::PutObject => "put_object",
            Step::SetObjectPolicy => "set_object_policy",
            Step::GetObject => "get_object",
            Step::ListObjects => "list_objects",
            Step::DeleteObject => "delete_object",
            Step::DeleteBucket => "delete_bucket",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnostic details of the failure that ended a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        match err {
            Error::Service(e) => Self {
                kind: ErrorKind::Service,
                message: e.message.clone(),
                status_code: e.status_code,
                error_code: e.error_code.clone(),
                error_type: Some(e.error_type),
                request_id: e.request_id.clone(),
            },
            Error::Client(message) => Self {
                kind: ErrorKind::Client,
                message: message.clone(),
                status_code: None,
                error_code: None,
                error_type: None,
                request_id: None,
            },
            other => Self {
                kind: other.kind(),
                message: other.to_string(),
                status_code: None,
                error_code: None,
                error_type: None,
                request_id: None,
            },
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Aborted { step: Step, error: ErrorReport },
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub bucket: String,
    pub key: String,
    pub completed: Vec<Step>,
    pub outcome: Outcome,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Runs the workflow against an injected client and temp file provider
pub struct StorageDemoRunner<'a, C: ?Sized, P: ?Sized> {
    client: &'a C,
    files: &'a P,
    payload_lines: Vec<String>,
}

impl<'a, C, P> StorageDemoRunner<'a, C, P>
where
    C: ObjectStorageClient + ?Sized,
    P: TempFileProvider + ?Sized,
{
    pub fn new(client: &'a C, files: &'a P) -> Self {
        Self {
            client,
            files,
            payload_lines: PAYLOAD_LINES.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Replace the text written to the payload file
    pub fn with_payload_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payload_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Execute every step in order, stopping at the first failure
    ///
    /// The session is consumed: its payload file is deleted before this
    /// returns, on every path.
    pub async fn run<W: Write + ?Sized>(
        &self,
        mut session: Session,
        out: &mut W,
    ) -> Result<RunReport> {
        let mut report = RunReport {
            bucket: session.bucket.clone(),
            key: session.key.clone(),
            completed: Vec::with_capacity(Step::SEQUENCE.len()),
            outcome: Outcome::Completed,
        };

        write_banner(out)?;

        for step in Step::SEQUENCE {
            tracing::debug!(%step, bucket = %session.bucket, "Running step");
            match self.execute(step, &mut session, out).await {
                Ok(()) => report.completed.push(step),
                Err(e) if e.is_reportable() => {
                    tracing::warn!(%step, error = %e, "Session aborted");
                    write_error_report(out, &e)?;
                    report.outcome = Outcome::Aborted {
                        step,
                        error: ErrorReport::from(&e),
                    };
                    return Ok(report);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(bucket = %session.bucket, "Session completed");
        Ok(report)
    }

    /// Execute a single step against the session
    pub async fn execute<W: Write + ?Sized>(
        &self,
        step: Step,
        session: &mut Session,
        out: &mut W,
    ) -> Result<()> {
        match step {
            Step::CreateBucket => {
                writeln!(out, "Creating bucket {}\n", session.bucket)?;
                self.client.create_bucket(&session.bucket).await
            }
            Step::ListBuckets => {
                writeln!(out, "Listing buckets")?;
                for bucket in self.client.list_buckets().await? {
                    writeln!(out, " - {}", bucket.key)?;
                }
                Ok(())
            }
            Step::SetBucketPolicy => {
                let mut policy = self
                    .client
                    .get_bucket_access_policy(&session.bucket)
                    .await?;
                policy.grant(Grantee::AllUsers, Permission::Read);
                self.client
                    .set_bucket_access_policy(&session.bucket, &policy)
                    .await?;
                tracing::debug!(
                    bucket = %session.bucket,
                    public_read = policy.allows_public_read(),
                    grants = policy.grants.len(),
                    "Updated bucket ACL"
                );
                session.public_policy = Some(policy);
                Ok(())
            }
            Step::CreatePayload => {
                let lines: Vec<&str> = self.payload_lines.iter().map(String::as_str).collect();
                session.payload = Some(self.files.create(&lines)?);
                Ok(())
            }
            Step::PutObject => {
                writeln!(out, "Uploading a new object to S3 from a file\n")?;
                let payload = session_payload(session)?;
                let info = self
                    .client
                    .put_object(&session.bucket, &session.key, payload.path())
                    .await?;
                tracing::debug!(
                    key = %info.key,
                    written = payload.bytes_written(),
                    stored = ?info.size_bytes,
                    "Uploaded object"
                );
                Ok(())
            }
            Step::SetObjectPolicy => {
                let policy = match &session.public_policy {
                    Some(policy) => policy.clone(),
                    None => {
                        let mut policy = self
                            .client
                            .get_object_access_policy(&session.bucket, &session.key)
                            .await?;
                        policy.grant(Grantee::AllUsers, Permission::Read);
                        policy
                    }
                };
                self.client
                    .set_object_access_policy(&session.bucket, &session.key, &policy)
                    .await
            }
            Step::GetObject => {
                writeln!(out, "Downloading an object")?;
                let content = self
                    .client
                    .get_object(&session.bucket, &session.key)
                    .await?;
                writeln!(
                    out,
                    "Content-Type: {}",
                    content.content_type.as_deref().unwrap_or("")
                )?;

                write_indented_lines(content.body, out).await?;
                writeln!(out)?;
                Ok(())
            }
            Step::ListObjects => {
                writeln!(out, "Listing objects")?;
                let objects = self
                    .client
                    .list_objects(&session.bucket, &session.list_prefix)
                    .await?;
                for object in objects {
                    writeln!(
                        out,
                        " - {}  (size = {})",
                        object.key,
                        object.size_bytes.unwrap_or(0)
                    )?;
                }
                Ok(())
            }
            Step::DeleteObject => {
                writeln!(out, "Deleting an object\n")?;
                self.client
                    .delete_object(&session.bucket, &session.key)
                    .await
            }
            Step::DeleteBucket => {
                writeln!(out, "Deleting bucket {}\n", session.bucket)?;
                self.client.delete_bucket(&session.bucket).await
            }
        }
    }
}

/// Copy a text body to `out`, four spaces in front of every line
///
/// Invalid UTF-8 is replaced rather than rejected; only a failing stream
/// ends the step, as a fatal I/O error.
async fn write_indented_lines<R, W>(body: R, out: &mut W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: Write + ?Sized,
{
    let mut reader = BufReader::new(body);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            return Ok(());
        }
        let decoded = String::from_utf8_lossy(&raw);
        let line = decoded.strip_suffix('\n').unwrap_or(&decoded);
        let line = line.strip_suffix('\r').unwrap_or(line);
        writeln!(out, "    {line}")?;
    }
}

fn session_payload(session: &Session) -> Result<&PayloadFile> {
    session.payload.as_ref().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "payload file has not been created",
        ))
    })
}

/// Write the run header
pub fn write_banner<W: Write + ?Sized>(out: &mut W) -> Result<()> {
    writeln!(out, "{BANNER_RULE}")?;
    writeln!(out, "{BANNER_TITLE}")?;
    writeln!(out, "{BANNER_RULE}\n")?;
    Ok(())
}

/// Write the diagnostic block for a service or client failure
pub fn write_error_report<W: Write + ?Sized>(out: &mut W, err: &Error) -> Result<()> {
    match err {
        Error::Service(e) => {
            writeln!(
                out,
                "Caught a service error, which means your request made it to the storage \
                 service, but was rejected with an error response for some reason."
            )?;
            writeln!(out, "Error Message:    {}", e.message)?;
            writeln!(out, "HTTP Status Code: {}", display_opt(e.status_code))?;
            writeln!(out, "Error Code:       {}", display_opt(e.error_code.as_ref()))?;
            writeln!(out, "Error Type:       {}", e.error_type)?;
            writeln!(out, "Request ID:       {}", display_opt(e.request_id.as_ref()))?;
        }
        Error::Client(message) => {
            writeln!(
                out,
                "Caught a client error, which means the client encountered a serious \
                 internal problem while trying to communicate with the storage service, \
                 such as not being able to access the network."
            )?;
            writeln!(out, "Error Message: {message}")?;
        }
        other => writeln!(out, "Error: {other}")?,
    }
    Ok(())
}

fn display_opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
