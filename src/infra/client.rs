//! Merge backend collaborator: upload, content fetch and merge.
//!
//! [`MergeBackend`] is the seam the session talks through. [`HttpBackend`]
//! speaks the JSON/multipart API under a base URL such as
//! `http://localhost:8080/api`. Calls are fire-and-await; nothing is retried.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::collection::Candidate;
use crate::core::merge::MergeRequest;
use crate::infra::io::read_content;

pub trait MergeBackend {
    /// Upload a batch. The reply is returned raw so the caller can recover
    /// from malformed id lists.
    fn upload(&self, files: &[Candidate]) -> Result<Value>;

    fn fetch_content(&self, id: &str) -> Result<String>;

    /// Merged output bytes, not interpreted.
    fn merge(&self, request: &MergeRequest) -> Result<Vec<u8>>;
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl MergeBackend for HttpBackend {
    #[instrument(skip_all, fields(count = files.len()))]
    fn upload(&self, files: &[Candidate]) -> Result<Value> {
        let mut form = multipart::Form::new();
        for file in files {
            let bytes = read_content(&file.content)?;
            let part = multipart::Part::bytes(bytes).file_name(file.name.clone());
            form = form.part("files", part);
        }

        let resp = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .context("Upload request failed")?;
        let body = ensure_success(resp)?
            .text()
            .context("Failed to read upload response")?;

        // A body that is not JSON still counts as an answer; ids get synthesized
        Ok(serde_json::from_str(&body).unwrap_or_else(|err| {
            warn!(%err, "upload response is not JSON");
            Value::Null
        }))
    }

    #[instrument(skip(self))]
    fn fetch_content(&self, id: &str) -> Result<String> {
        let resp = self
            .client
            .get(self.url(&format!("file/{id}")))
            .send()
            .context("Content request failed")?;
        let text = ensure_success(resp)?
            .text()
            .context("Failed to read file content")?;
        debug!(chars = text.chars().count(), "content received");
        Ok(text)
    }

    #[instrument(skip_all, fields(files = request.file_ids.len(), output = %request.output_filename))]
    fn merge(&self, request: &MergeRequest) -> Result<Vec<u8>> {
        let resp = self
            .client
            .post(self.url("merge"))
            .json(request)
            .send()
            .context("Merge request failed")?;
        let bytes = ensure_success(resp)?
            .bytes()
            .context("Failed to read merged output")?;
        Ok(bytes.to_vec())
    }
}

/// Turn a non-2xx response into an error carrying the backend's explanation.
fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().unwrap_or_default();
    anyhow::bail!("HTTP {}: {}", status, error_message(&body));
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            details: Some(details),
            ..
        }) if !details.is_empty() => details,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "no details".to_string(),
        _ => body.trim().to_string(),
    }
}
