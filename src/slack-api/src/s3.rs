//! Upload of deployment archives with presigned S3 POST parameters.

use std::path::Path;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use slack_protocol::{ErrorCode, SlackError, SlackResult};
use tracing::debug;

use crate::types::PresignedPost;

/// POSTs `archive` to the presigned location and returns the uploaded file
/// name. S3 answers a successful POST with `204 No Content`.
pub(crate) async fn upload_archive(
    client: &reqwest::Client,
    post: &PresignedPost,
    archive: &Path,
) -> SlackResult<String> {
    if post.url.is_empty() || post.file_name.is_empty() {
        return Err(SlackError::new(ErrorCode::S3Upload)
            .with_cause(SlackError::msg("missing presigned upload parameters")));
    }

    let bytes = tokio::fs::read(archive).await?;
    let size = bytes.len();

    let mut form = Form::new();
    for (name, value) in post.fields.form_fields() {
        form = form.text(name, value.to_string());
    }
    let file = Part::bytes(bytes)
        .file_name(post.file_name.clone())
        .mime_str("application/zip")
        .map_err(|e| SlackError::new(ErrorCode::S3Upload).with_cause(SlackError::msg(e.to_string())))?;
    form = form.part("file", file);

    debug!(url = %post.url, size, file_name = %post.file_name, "Uploading archive");
    let response = client
        .post(&post.url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| SlackError::new(ErrorCode::S3Upload).with_cause(SlackError::msg(e.to_string())))?;

    if response.status() != StatusCode::NO_CONTENT {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SlackError::new(ErrorCode::S3Upload)
            .with_cause(SlackError::msg(format!("{status}: {body}"))));
    }

    Ok(post.file_name.clone())
}
