use std::collections::HashMap;

use async_trait::async_trait;
use aw_config::ApiConfig;
use futures::TryStreamExt as _;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
    multipart::{Form, Part},
};
use serde_json::Value;
use tracing::{error, trace};

use crate::{
    error::{Error, Result},
    transport::{ChunkStream, Transport},
    types::{RunRequest, UploadRequest, UploadResponse},
};

#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    base_url: String,
    run_path: String,
    upload_path: String,
    token: Option<String>,
}

impl Client {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = ApiConfig::default();

        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            run_path: defaults.run_path,
            upload_path: defaults.upload_path,
            token: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            run_path: config.run_path.clone(),
            upload_path: config.upload_path.clone(),
            token: config.token.clone(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Build HTTP headers shared by all requests.
    /// Returns an error if any header value cannot be constructed.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid API token header format: {e}")))?,
            );
        }

        Ok(headers)
    }
}

#[async_trait]
impl Transport for Client {
    async fn run(&self, request: &RunRequest) -> Result<ChunkStream> {
        let url = self.url(&self.run_path);
        let mut headers = self.build_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        trace!(
            %url,
            headers = ?redacted(&headers),
            conversation_id = ?request.conversation_id,
            "Triggering agent run."
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await?;

        trace!(
            status = response.status().as_u16(),
            content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap_or_default()),
            "Received response."
        );

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(response).await);
        }

        Ok(Box::pin(response.bytes_stream().map_err(Error::from)))
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
        let url = self.url(&self.upload_path);
        let headers = self.build_headers()?;

        trace!(
            %url,
            file_name = %request.file_name,
            size = request.content.len(),
            conversation_id = ?request.conversation_id,
            "Uploading file."
        );

        let part = Part::bytes(request.content).file_name(request.file_name);
        let mut form = Form::new().part("file", part);
        if let Some(id) = request.conversation_id {
            form = form.text("conversation_id", String::from(id));
        }

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }
}

fn redacted(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            if k == AUTHORIZATION {
                return (k.to_string(), "[REDACTED]".to_owned());
            }

            (k.to_string(), v.to_str().unwrap_or_default().to_owned())
        })
        .collect()
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => return Error::Request(error),
    };

    error!(status, body, "Unexpected response.");

    Error::Api {
        status,
        message: error_message(&body).unwrap_or_else(|| format!("Request failed with status {status}")),
    }
}

/// Extract a structured error message from an error response body.
fn error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;

    ["detail", "error", "message"]
        .into_iter()
        .find_map(|key| match value.get(key)? {
            Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
            Value::Object(object) => object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
}
