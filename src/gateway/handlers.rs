use axum::body::Body;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::GatewayState;
use crate::errors::{AppError, AppResult};
use crate::models::ServiceType;
use crate::storage::assets;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopyRequest {
    pub source_path: Option<String>,
    pub service_type: Option<String>,
    pub target_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyResponse {
    pub success: bool,
    pub source_path: String,
    pub target_path: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub file_path: Option<String>,
}

/// File part written to the staging directory, not yet at its destination
struct StagedFile {
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl StagedFile {
    async fn discard(self) {
        if let Err(e) = assets::remove_if_exists(&self.path).await {
            log::warn!("Failed to remove staged upload {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Default)]
struct UploadForm {
    service_type: Option<String>,
    target_path: String,
    file: Option<StagedFile>,
}

impl UploadForm {
    async fn discard(self) {
        if let Some(file) = self.file {
            file.discard().await;
        }
    }
}

fn rejected(message: String) -> AppError {
    AppError::validation(message)
}

pub async fn upload(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|rejection| rejected(rejection.body_text()))?;

    // text fields may arrive after the file part, so the file is staged first
    let mut form = UploadForm::default();
    if let Err(e) = read_upload_form(&state.staging_dir, &mut multipart, &mut form).await {
        form.discard().await;
        return Err(e);
    }

    let Some(file) = form.file else {
        return Err(AppError::validation("No file uploaded"));
    };

    let service = ServiceType::from(form.service_type.as_deref());
    let destination = match store_upload(&state, service, &form.target_path, &file).await {
        Ok(destination) => destination,
        Err(e) => {
            file.discard().await;
            return Err(e);
        }
    };

    log::info!(
        "Stored upload {} ({} bytes) for service {}",
        destination.display(),
        file.size,
        service
    );

    Ok(Json(UploadResponse {
        success: true,
        file_path: destination.to_string_lossy().into_owned(),
        message: "File uploaded successfully".to_string(),
    }))
}

async fn read_upload_form(
    staging_dir: &Path,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("Failed reading multipart field: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let staged = stage_file(staging_dir, field).await?;
                if let Some(previous) = form.file.replace(staged) {
                    previous.discard().await;
                }
            }
            "serviceType" => form.service_type = Some(read_text(field, &name).await?),
            "targetPath" => form.target_path = read_text(field, &name).await?,
            _ => {}
        }
    }
    Ok(())
}

async fn read_text(field: Field<'_>, name: &str) -> AppResult<String> {
    field.text().await.map_err(|err| {
        AppError::validation(format!("Failed reading multipart '{}' field: {}", name, err))
    })
}

/// Stream a file part to disk chunk by chunk
async fn stage_file(staging_dir: &Path, mut field: Field<'_>) -> AppResult<StagedFile> {
    let file_name = field
        .file_name()
        .and_then(|raw| Path::new(raw).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::validation("Uploaded file has no name"))?;

    assets::ensure_dir(staging_dir).await?;
    let path = staging_dir.join(format!("{}.part", Uuid::new_v4()));

    match write_chunks(&mut field, &path).await {
        Ok(size) => Ok(StagedFile {
            path,
            file_name,
            size,
        }),
        Err(e) => {
            if let Err(cleanup) = assets::remove_if_exists(&path).await {
                log::warn!("Failed to remove partial upload {}: {}", path.display(), cleanup);
            }
            Err(e)
        }
    }
}

async fn write_chunks(field: &mut Field<'_>, path: &Path) -> AppResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut size = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(|err| {
        AppError::validation(format!("Failed reading multipart 'file' field: {err}"))
    })? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

async fn store_upload(
    state: &GatewayState,
    service: ServiceType,
    target_path: &str,
    file: &StagedFile,
) -> AppResult<PathBuf> {
    let target_dir = state.paths.resolve_dir(service, target_path).await?;
    let destination = target_dir.join(&file.file_name);
    assets::move_file(&file.path, &destination).await?;
    Ok(destination)
}

pub async fn download(
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|rejection| rejected(rejection.body_text()))?;
    let file_path = query
        .file_path
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| AppError::validation("filePath is required"))?;

    if !assets::exists(&file_path).await {
        return Err(AppError::not_found(format!(
            "File not found: {}",
            file_path.display()
        )));
    }

    let file = tokio::fs::File::open(&file_path).await?;
    let length = file.metadata().await?.len();
    let file_name = assets::file_name(&file_path)?;

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, length);
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response = response.header(header::CONTENT_DISPOSITION, value);
    }

    response
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| AppError::Other(err.into()))
}

pub async fn copy(
    State(state): State<GatewayState>,
    request: Result<Json<CopyRequest>, JsonRejection>,
) -> AppResult<Json<CopyResponse>> {
    let Json(request) = request.map_err(|rejection| rejected(rejection.body_text()))?;
    let source_path = request
        .source_path
        .filter(|path| !path.is_empty())
        .ok_or_else(|| AppError::validation("sourcePath is required"))?;
    let source = PathBuf::from(&source_path);

    if !assets::exists(&source).await {
        return Err(AppError::not_found(format!("Source file not found: {}", source_path)));
    }

    let service = ServiceType::from(request.service_type.as_deref());
    let target_dir = state
        .paths
        .resolve_dir(service, request.target_path.as_deref().unwrap_or_default())
        .await?;
    let destination = target_dir.join(assets::file_name(&source)?);
    assets::copy_file(&source, &destination).await?;

    Ok(Json(CopyResponse {
        success: true,
        source_path,
        target_path: destination.to_string_lossy().into_owned(),
        message: "File copied successfully".to_string(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
