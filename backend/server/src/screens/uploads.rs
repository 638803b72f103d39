use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use gateway::Gateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::AppError,
    guard::Staff,
    screens::Payload,
    state::AppState,
    upload::{ImageUploader, UploadError, UploadFile},
};

/// Slot used by `POST /uploads/{bucket}`, for forms with a single image.
pub const DEFAULT_SLOT: &str = "image";

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WidgetView {
    pub preview: Option<String>,
    pub uploading: bool,
}

impl From<&ImageUploader> for WidgetView {
    fn from(uploader: &ImageUploader) -> Self {
        Self {
            preview: uploader.preview(),
            uploading: uploader.is_uploading(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenWidget {
    #[serde(default)]
    pub current: String,
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }.into()
    } else {
        AppError::MalformedPayload(e.body_text())
    }
}

fn widget<G: Gateway>(
    state: &AppState<G>,
    staff: &Staff,
    bucket: String,
    slot: &str,
) -> Result<Arc<ImageUploader>, AppError> {
    if !state.config.allows_bucket(&bucket) {
        return Err(UploadError::UnknownBucket(bucket).into());
    }

    Ok(state.uploads.widget(&staff.user.id, &bucket, slot))
}

async fn read_file(mut multipart: Multipart, limit: usize) -> Result<UploadFile, AppError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        file = Some(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    file.ok_or_else(|| AppError::MalformedPayload("missing file field".to_string()))
}

async fn receive<G: Gateway>(
    state: &AppState<G>,
    staff: &Staff,
    bucket: String,
    slot: &str,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    let uploader = widget(state, staff, bucket, slot)?;
    let file = read_file(multipart, state.config.max_upload_bytes).await?;

    let url = uploader
        .upload(&state.scoped(&staff.session), file, |url| {
            debug!(url, "Upload reported")
        })
        .await?;

    Ok(Json(Uploaded { url }))
}

/// Accepts a multipart form with one `file` field and stores it in `bucket`.
#[instrument(skip_all, fields(%bucket))]
pub async fn upload_image<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path(bucket): Path<String>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    receive(&state, &staff, bucket, DEFAULT_SLOT, multipart).await
}

#[instrument(skip_all, fields(%bucket, %slot))]
pub async fn upload_to_slot<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path((bucket, slot)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Uploaded>, AppError> {
    receive(&state, &staff, bucket, &slot, multipart).await
}

pub async fn show_slot<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path((bucket, slot)): Path<(String, String)>,
) -> Result<Json<WidgetView>, AppError> {
    let uploader = widget(&state, &staff, bucket, &slot)?;

    Ok(Json(WidgetView::from(uploader.as_ref())))
}

/// Opens the slot on the image the edited record already has.
#[instrument(skip_all, fields(%bucket, %slot))]
pub async fn open_slot<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path((bucket, slot)): Path<(String, String)>,
    Payload(open): Payload<OpenWidget>,
) -> Result<Json<WidgetView>, AppError> {
    let uploader = widget(&state, &staff, bucket, &slot)?;
    uploader.set_current(&state.scoped(&staff.session), &open.current)?;

    Ok(Json(WidgetView::from(uploader.as_ref())))
}

#[instrument(skip_all, fields(%bucket, %slot))]
pub async fn clear_slot<G: Gateway>(
    State(state): State<Arc<AppState<G>>>,
    Extension(staff): Extension<Staff>,
    Path((bucket, slot)): Path<(String, String)>,
) -> Result<Json<Uploaded>, AppError> {
    let uploader = widget(&state, &staff, bucket, &slot)?;

    let mut url = String::new();
    uploader
        .clear(&state.scoped(&staff.session), |cleared| url = cleared.to_string())
        .await?;
    info!(by = %staff.user.id, "Image slot cleared");

    Ok(Json(Uploaded { url }))
}
