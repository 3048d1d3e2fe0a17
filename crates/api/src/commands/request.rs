//! Request commands

use std::path::PathBuf;

use mani_infra::api::{ApiError, ApiResponse, Method, RequestDescriptor};
use serde_json::{json, Value};

use super::CommandError;
use crate::cli::RequestArgs;
use crate::context::AppContext;

/// Send a request with an optional JSON body
///
/// # Errors
/// Returns `ApiError::InvalidRequest` if `body` is not valid JSON, otherwise
/// whatever the client returns
pub async fn send(
    ctx: &AppContext,
    method: Method,
    args: RequestArgs,
    body: Option<&str>,
) -> Result<Value, CommandError> {
    let mut request = RequestDescriptor::new(method, args.path).headers(args.headers);

    if let Some(raw) = body {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ApiError::InvalidRequest(format!("--json is not valid JSON: {}", e)))?;
        request = request.json(&value)?;
    }

    let response: ApiResponse<Value> = ctx.client.execute(request).await?;
    Ok(envelope(response))
}

/// Upload media files as `media` parts
///
/// # Errors
/// Returns `ApiError::InvalidRequest` if a file cannot be read, is not a
/// video or image, or too many are given
pub async fn upload(
    ctx: &AppContext,
    args: RequestArgs,
    files: &[PathBuf],
) -> Result<Value, CommandError> {
    let request = RequestDescriptor::post(args.path).headers(args.headers);
    let response: ApiResponse<Value> = ctx.client.upload_media(request, files).await?;
    Ok(envelope(response))
}

fn envelope(response: ApiResponse<Value>) -> Value {
    json!({ "status": response.status, "data": response.data })
}
