use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gateway::{
    GatewayError,
    models::{InvalidDraft, calculator::InvalidSetting},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::upload::UploadError;

#[derive(Serialize)]
pub struct ErrorResponse<'a> {
    pub message: &'a str,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid record: {0}")]
    InvalidDraft(#[from] InvalidDraft),

    #[error("Invalid setting: {0}")]
    InvalidSetting(#[from] InvalidSetting),

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Status cannot move from {from} to {to}")]
    StatusTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload(_)
            | AppError::InvalidDraft(_)
            | AppError::InvalidSetting(_) => StatusCode::BAD_REQUEST,
            AppError::BadCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StatusTransition { .. } => StatusCode::CONFLICT,
            AppError::Upload(e) => match e {
                UploadError::NotAnImage(_) => StatusCode::BAD_REQUEST,
                UploadError::UnknownBucket(_) => StatusCode::NOT_FOUND,
                UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::Busy => StatusCode::CONFLICT,
                UploadError::Storage(e) => gateway_status(e),
            },
            AppError::Gateway(e) => gateway_status(e),
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn gateway_status(e: &GatewayError) -> StatusCode {
    match e {
        GatewayError::Rejected { .. } => StatusCode::BAD_REQUEST,
        GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
        GatewayError::Unwritten(_) => StatusCode::CONFLICT,
        GatewayError::Transport(_)
        | GatewayError::Unavailable(_)
        | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
        GatewayError::Url(_) | GatewayError::InvalidHeader(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = %message, "Request failed");
        } else {
            warn!(error = %message, %status, "Request refused");
        }

        (status, Json(ErrorResponse { message: &message })).into_response()
    }
}
