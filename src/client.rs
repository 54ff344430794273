//! HTTP side of the form: one `POST /download` per attempt.

use std::{path::Path, time::Duration};

use futures_util::StreamExt;
use reqwest::{Client, Response, header::CONTENT_DISPOSITION};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    content_disposition::{header_text, suggested_filename},
    error::{DownloadError, GENERIC_DETAIL, Result},
    model::DownloadRequest,
    progress::ProgressReporter,
    save::{SavedFile, TransientFile},
};

/// Client for the external download service
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// `timeout` of None means the request may take as long as the server needs.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/download", self.base_url.trim_end_matches('/'))
    }

    /// Sends the request and returns the response only when it is 2xx.
    pub async fn send(&self, request: &DownloadRequest) -> Result<Response> {
        let response = self.http.post(self.endpoint()).json(request).send().await?;
        debug!(status = %response.status(), "download service responded");

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Full attempt: request, pick the filename, stream the body into `dir`.
    pub async fn download_to(
        &self,
        request: &DownloadRequest,
        dir: &Path,
        mut progress: Option<ProgressReporter>,
    ) -> Result<SavedFile> {
        let response = self.send(request).await?;

        let header = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .map(|v| header_text(v.as_bytes()));
        let filename = suggested_filename(header.as_deref(), request.format);
        debug!(%filename, content_disposition = ?header, "resolved download filename");

        if let Some(reporter) = progress.as_mut() {
            reporter.set_total(response.content_length());
        }

        let mut file = TransientFile::create_in(dir)?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_chunk(&chunk).await?;
            if let Some(reporter) = progress.as_mut() {
                reporter.advance(chunk.len());
            }
        }

        Ok(file.persist(dir, &filename).await?)
    }
}

async fn error_from_response(response: Response) -> DownloadError {
    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(body) => error_from_body(status, &body),
        Err(e) => e.into(),
    }
}

/// Any JSON body is accepted; its `detail` is used when present.
fn error_from_body(status: u16, body: &[u8]) -> DownloadError {
    match serde_json::from_slice::<Value>(body) {
        Ok(parsed) => {
            let detail = detail_text(parsed.get("detail"));
            warn!(status, %detail, "download service rejected the request");
            DownloadError::Server { status, detail }
        }
        Err(source) => {
            warn!(status, "download service sent a non-JSON error body");
            DownloadError::MalformedErrorBody { status, source }
        }
    }
}

/// `detail` is usually a string; validation failures send a list of `{msg, ...}`.
fn detail_text(detail: Option<&Value>) -> String {
    let text = match detail {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                other => other.get("msg").and_then(Value::as_str),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    };

    if text.trim().is_empty() {
        GENERIC_DETAIL.to_string()
    } else {
        text
    }
}
