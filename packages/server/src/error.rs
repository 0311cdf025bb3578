use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::PinError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `ACCESS_DENIED`, `NOT_FOUND`,
    /// `EMAIL_TAKEN`, `ALREADY_SIGNED`, `SIGNATURE_IMAGE_REQUIRED`,
    /// `CANNOT_DELETE_SIGNED`, `UPLOAD_FAILED`, `PDF_RENDER_FAILED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Hours must be >= 0")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// Caller is authenticated but is neither owner nor guest of the resource.
    AccessDenied,
    /// Covers both "does not exist" and "exists but not owned" so that
    /// ownership probing leaks nothing.
    NotFound(String),
    EmailTaken,
    /// The signature sub-state is a one-way transition; a second sign attempt
    /// (or a lost sign race) always lands here.
    AlreadySigned,
    SignatureImageRequired,
    CannotDeleteSigned,
    /// Pinning the signature image failed before anything was persisted.
    UploadFailed(String),
    PdfRenderFailed(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::AccessDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "ACCESS_DENIED",
                    message: "You do not have access to this delivery note".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "Email is already registered".into(),
                },
            ),
            AppError::AlreadySigned => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ALREADY_SIGNED",
                    message: "Delivery note is already signed".into(),
                },
            ),
            AppError::SignatureImageRequired => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "SIGNATURE_IMAGE_REQUIRED",
                    message: "A signature image file is required".into(),
                },
            ),
            AppError::CannotDeleteSigned => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "CANNOT_DELETE_SIGNED",
                    message: "Signed delivery notes cannot be deleted through this endpoint".into(),
                },
            ),
            AppError::UploadFailed(detail) => {
                tracing::error!("Artifact upload failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "UPLOAD_FAILED",
                        message: "Failed to store artifact".into(),
                    },
                )
            }
            AppError::PdfRenderFailed(detail) => {
                tracing::error!("PDF render failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PDF_RENDER_FAILED",
                        message: "Failed to generate PDF".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<PinError> for AppError {
    fn from(err: PinError) -> Self {
        AppError::UploadFailed(err.to_string())
    }
}
