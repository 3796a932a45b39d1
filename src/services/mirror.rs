//! Client that mirrors local files to the remote file gateway

use anyhow::{anyhow, Context};
use reqwest::{multipart, Body};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tokio_util::task::TaskTracker;

use crate::config::ConfigStore;
use crate::errors::{AppError, AppResult};
use crate::models::{ServiceType, UploadResult};
use crate::storage::assets;
use crate::utils::http::{error_text, HTTP_CLIENT};

/// How a caller reacts to a failed mirror upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorPolicy {
    /// Await the upload; failure aborts the caller
    Fatal,
    /// Spawn the upload and return immediately; failure is only logged
    Detached,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayUploadReply {
    #[serde(default)]
    success: bool,
    file_path: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct RemoteMirror {
    config: Arc<ConfigStore>,
    detached: TaskTracker,
}

impl RemoteMirror {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            config,
            detached: TaskTracker::new(),
        }
    }

    /// Wait for every detached upload spawned so far.
    ///
    /// Only for short-lived processes that would otherwise exit mid-upload.
    pub async fn flush(&self) {
        self.detached.close();
        self.detached.wait().await;
        self.detached.reopen();
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_mirror_enabled()
    }

    /// Mirror `local_path` under (`service`, `category`) if mirroring is enabled.
    ///
    /// Returns `None` when mirroring is disabled or the upload was detached.
    pub async fn mirror(
        &self,
        local_path: &Path,
        service: ServiceType,
        category: &str,
        policy: MirrorPolicy,
        label: &str,
    ) -> AppResult<Option<UploadResult>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        log::debug!("Start uploading {} to remote server...", label);

        match policy {
            MirrorPolicy::Fatal => {
                let result = self
                    .upload(local_path, service, category)
                    .await
                    .map_err(|e| {
                        log::error!("Failed to upload {}: {:#}", label, e);
                        AppError::upstream(format!("Failed to upload {}", label), e)
                    })?;
                log::debug!("{} uploaded successfully: {}", label, result.remote_path);
                Ok(Some(result))
            }
            MirrorPolicy::Detached => {
                let mirror = self.clone();
                let local_path = local_path.to_path_buf();
                let category = category.to_string();
                let label = label.to_string();
                self.detached.spawn(async move {
                    match mirror.upload(&local_path, service, &category).await {
                        Ok(result) => {
                            log::debug!("{} uploaded successfully: {}", label, result.remote_path)
                        }
                        Err(e) => log::error!("Failed to upload {}: {:#}", label, e),
                    }
                });
                Ok(None)
            }
        }
    }

    /// Upload one file to the remote gateway's `/upload` endpoint
    pub async fn upload(
        &self,
        local_path: &Path,
        service: ServiceType,
        category: &str,
    ) -> anyhow::Result<UploadResult> {
        let config = self.config.get();
        let url = format!("{}/upload", config.file_server_url());

        let file = tokio::fs::File::open(local_path)
            .await
            .with_context(|| format!("Failed to open {}", local_path.display()))?;
        let length = file.metadata().await?.len();
        let file_name = assets::file_name(local_path)?;

        let part = multipart::Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(file_name);
        let form = multipart::Form::new()
            .text("serviceType", service.as_str())
            .text("targetPath", category.to_string())
            .part("file", part);

        let response = HTTP_CLIENT
            .post(&url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Upload request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_text(response).await;
            return Err(anyhow!(
                "Upload failed with status {}: {}",
                status,
                error_text
            ));
        }

        let reply: GatewayUploadReply = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        match (reply.success, reply.file_path) {
            (true, Some(remote_path)) => Ok(UploadResult {
                local_path: local_path.to_path_buf(),
                remote_path,
                service_type: service,
                category: category.to_string(),
            }),
            (_, _) => Err(anyhow!(
                "Remote gateway rejected upload: {}",
                reply.error.unwrap_or_else(|| "no file path returned".to_string())
            )),
        }
    }
}
