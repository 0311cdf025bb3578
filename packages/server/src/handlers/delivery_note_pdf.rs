use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::delivery_note;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, DownloadUser};
use crate::handlers::delivery_note::{find_note_for_participant, resolve_detail};
use crate::models::delivery_note::DeliveryNoteResponse;
use crate::state::AppState;
use crate::utils::filename;

/// Signature images are small; 10 MiB leaves generous headroom for
/// high-resolution captures.
const MAX_SIGNATURE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn signature_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_SIGNATURE_UPLOAD_BYTES)
}

/// Download-path lookup. Unlike the sign path, an existing note the caller
/// cannot reach answers 403: download links are shared out of band, and a
/// recipient whose access was never granted should learn that, not chase a
/// dead link.
async fn find_note_for_download(
    db: &DatabaseConnection,
    id: i32,
    user_id: i32,
) -> Result<delivery_note::Model, AppError> {
    let note = delivery_note::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {} not found", id)))?;

    if note.created_by != user_id && !note.guest_access.contains(user_id) {
        return Err(AppError::AccessDenied);
    }
    Ok(note)
}

#[utoipa::path(
    post,
    path = "/{id}/sign",
    tag = "DeliveryNotes",
    operation_id = "signDeliveryNote",
    summary = "Sign a delivery note with a handwritten signature image",
    description = "Accessible to the note's creator and its guests. Multipart form with a `file` image part and an optional `signed_by` text part (defaults to the caller's name). Signing is one-way: the first signature wins and later attempts fail with ALREADY_SIGNED. The signed PDF is pinned asynchronously; `pdf.pending` stays true until that completes.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    responses(
        (status = 200, description = "Note signed; PDF pin in progress", body = DeliveryNoteResponse),
        (status = 400, description = "Missing image or already signed (SIGNATURE_IMAGE_REQUIRED, ALREADY_SIGNED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Note absent or caller is neither creator nor guest (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Pinning service rejected the image (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(id, user_id = auth_user.user_id))]
pub async fn sign_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<DeliveryNoteResponse>, AppError> {
    let note = find_note_for_participant(&state.db, id, auth_user.user_id).await?;
    if note.signature_is_signed {
        return Err(AppError::AlreadySigned);
    }

    let mut image: Option<(Vec<u8>, Option<String>)> = None;
    let mut signed_by: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?;
                image = Some((bytes.to_vec(), content_type));
            }
            Some("signed_by") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field: {}", e)))?;
                if !text.trim().is_empty() {
                    signed_by = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let (image_bytes, content_type) = image.ok_or(AppError::SignatureImageRequired)?;
    if image_bytes.is_empty() {
        return Err(AppError::SignatureImageRequired);
    }
    let signed_by = signed_by.unwrap_or_else(|| auth_user.name.clone());

    let now = chrono::Utc::now();
    let ext = filename::signature_image_extension(content_type.as_deref());
    let upload_name = filename::signature_filename(&note.number, now.timestamp_millis(), ext);

    // Pin the image before touching the row: a rejected upload must leave
    // the note unsigned.
    let content_id = state.content_store.put(image_bytes, &upload_name).await?;
    let image_url = state.content_store.url_for(&content_id);

    // One-way transition enforced in the database: the guard on
    // signature_is_signed makes concurrent sign attempts race for a single
    // winning row update.
    let result = delivery_note::Entity::update_many()
        .col_expr(delivery_note::Column::SignatureIsSigned, Expr::value(true))
        .col_expr(delivery_note::Column::SignatureDate, Expr::value(now))
        .col_expr(
            delivery_note::Column::SignatureSignedBy,
            Expr::value(signed_by),
        )
        .col_expr(
            delivery_note::Column::SignatureContentId,
            Expr::value(content_id.to_string()),
        )
        .col_expr(
            delivery_note::Column::SignatureImageUrl,
            Expr::value(image_url),
        )
        .col_expr(delivery_note::Column::PdfPending, Expr::value(true))
        .col_expr(delivery_note::Column::UpdatedAt, Expr::value(now))
        .filter(delivery_note::Column::Id.eq(note.id))
        .filter(delivery_note::Column::SignatureIsSigned.eq(false))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::AlreadySigned);
    }

    let signed = delivery_note::Entity::find_by_id(note.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {} not found", note.id)))?;

    spawn_pdf_pin(state.clone(), signed.id);

    Ok(Json(signed.into()))
}

/// Render the signed note and pin the PDF in the background. Failure leaves
/// `pdf_pending` raised; the partial state is visible to clients and a later
/// re-sign is not needed to retry a download, which always re-renders.
fn spawn_pdf_pin(state: AppState, note_id: i32) {
    tokio::spawn(async move {
        if let Err(e) = pin_note_pdf(&state, note_id).await {
            tracing::error!(note_id, error = ?e, "post-sign PDF pin failed");
        }
    });
}

async fn pin_note_pdf(state: &AppState, note_id: i32) -> Result<(), AppError> {
    let note = delivery_note::Entity::find_by_id(note_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {} not found", note_id)))?;
    let number = note.number.clone();

    let detail = resolve_detail(&state.db, note).await?;
    let pdf_bytes = state
        .renderer
        .render(&detail)
        .await
        .map_err(|e| AppError::PdfRenderFailed(e.to_string()))?;

    let now = chrono::Utc::now();
    let upload_name = filename::pdf_filename(&number, now.timestamp_millis());
    let content_id = state.content_store.put(pdf_bytes, &upload_name).await?;
    let url = state.content_store.url_for(&content_id);

    delivery_note::Entity::update_many()
        .col_expr(delivery_note::Column::PdfPending, Expr::value(false))
        .col_expr(
            delivery_note::Column::PdfContentId,
            Expr::value(content_id.to_string()),
        )
        .col_expr(delivery_note::Column::PdfUrl, Expr::value(url))
        .col_expr(delivery_note::Column::PdfGeneratedAt, Expr::value(now))
        .col_expr(delivery_note::Column::UpdatedAt, Expr::value(now))
        .filter(delivery_note::Column::Id.eq(note_id))
        .exec(&state.db)
        .await?;

    tracing::info!(note_id, "signed PDF pinned");
    Ok(())
}

#[utoipa::path(
    get,
    path = "/{id}/pdf",
    tag = "DeliveryNotes",
    operation_id = "downloadDeliveryNotePdf",
    summary = "Download the delivery note as a PDF",
    description = "Accessible to the note's creator and its guests. The token may arrive in the Authorization header or as the raw query string for header-less download links. The document is rendered fresh on every request and reflects the note's current state, including the signature block when signed.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is neither creator nor guest (ACCESS_DENIED)", body = ErrorBody),
        (status = 404, description = "Delivery note not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Rendering failed (PDF_RENDER_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, download_user), fields(id, user_id = download_user.user_id))]
pub async fn get_delivery_note_pdf(
    download_user: DownloadUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let note = find_note_for_download(&state.db, id, download_user.user_id).await?;
    let number = note.number.clone();

    let detail = resolve_detail(&state.db, note).await?;
    let pdf_bytes = state
        .renderer
        .render(&detail)
        .await
        .map_err(|e| AppError::PdfRenderFailed(e.to_string()))?;

    let download_name = filename::pdf_filename(&number, chrono::Utc::now().timestamp_millis());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        pdf_bytes,
    ))
}
