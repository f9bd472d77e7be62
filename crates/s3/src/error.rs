//! Classification of SDK errors
//!
//! Every `SdkError` becomes either a service error (the request reached S3
//! and a response came back) or a client error (it never got that far).

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::RequestId;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_types::error::display::DisplayErrorContext;

use ssd_core::{Error, ServiceError};

const REQUEST_ID_HEADER: &str = "x-amz-request-id";

/// Convert an SDK error into the crate's error taxonomy
pub(crate) fn classify<E>(err: SdkError<E, HttpResponse>) -> Error
where
    E: std::error::Error + ProvideErrorMetadata + RequestId + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let source = ctx.err();
            let raw = ctx.raw();
            let message = source
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(source).to_string());

            let mut service = ServiceError::new(message, Some(raw.status().as_u16()));
            if let Some(code) = source.code() {
                service = service.with_code(code);
            }
            if let Some(id) = source
                .request_id()
                .or_else(|| raw.headers().get(REQUEST_ID_HEADER))
            {
                service = service.with_request_id(id);
            }
            tracing::debug!(error = %service, "S3 rejected request");
            service.into()
        }
        SdkError::ResponseError(ctx) => {
            // A response arrived but could not be parsed
            let raw = ctx.raw();
            let mut service =
                ServiceError::new(DisplayErrorContext(&err).to_string(), Some(raw.status().as_u16()));
            if let Some(id) = raw.headers().get(REQUEST_ID_HEADER) {
                service = service.with_request_id(id);
            }
            service.into()
        }
        _ => Error::Client(DisplayErrorContext(&err).to_string()),
    }
}
