use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::delivery_note::{self, GuestAccess, HoursEntries, MaterialEntries};
use crate::entity::{client, project, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::project::find_project_for_owner;
use crate::models::delivery_note::{
    AddGuestRequest, AddGuestResponse, ChangeStatusRequest, CreateDeliveryNoteRequest,
    DeliveryNoteDetail, DeliveryNoteListQuery, DeliveryNoteResponse, HoursEntryDetail, PdfState,
    SignatureState, UpdateDeliveryNoteRequest, UserSummary, compute_is_simple,
    validate_create_delivery_note, validate_update_delivery_note,
};
use crate::state::AppState;
use crate::utils::numbering;

/// Fetch a delivery note the caller created. Absent and not-owned are both
/// `NOT_FOUND` so note ids cannot be probed.
pub async fn find_note_for_owner<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<delivery_note::Model, AppError> {
    delivery_note::Entity::find_by_id(id)
        .filter(delivery_note::Column::CreatedBy.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {} not found", id)))
}

/// Fetch a delivery note the caller participates in, either as its creator
/// or through guest access. Guest membership lives in a JSON column, so the
/// check happens after the fetch rather than in the query. Absent and
/// not-accessible both come back as `NOT_FOUND`.
pub async fn find_note_for_participant<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<delivery_note::Model, AppError> {
    let note = delivery_note::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Delivery note {} not found", id)))?;

    if note.created_by != user_id && !note.guest_access.contains(user_id) {
        return Err(AppError::NotFound(format!(
            "Delivery note {} not found",
            id
        )));
    }
    Ok(note)
}

/// Resolve a note into its detail view: project, client, creator, and the
/// users referenced by hours entries. Line users that no longer exist
/// resolve to `None` rather than failing the whole view.
pub async fn resolve_detail<C: ConnectionTrait>(
    db: &C,
    note: delivery_note::Model,
) -> Result<DeliveryNoteDetail, AppError> {
    let project = project::Entity::find_by_id(note.project_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Delivery note {} references missing project {}",
                note.id, note.project_id
            ))
        })?;

    let client = client::Entity::find_by_id(note.client_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Delivery note {} references missing client {}",
                note.id, note.client_id
            ))
        })?;

    let creator = user::Entity::find_by_id(note.created_by)
        .one(db)
        .await?
        .map(UserSummary::from);

    let mut user_ids: Vec<i32> = note.hours_entries.0.iter().map(|e| e.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let users: HashMap<i32, UserSummary> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect()
    };

    let hours_entries = note
        .hours_entries
        .0
        .into_iter()
        .map(|e| HoursEntryDetail {
            user_id: e.user_id,
            user: users.get(&e.user_id).cloned(),
            hours: e.hours,
            description: e.description,
            date: e.date,
        })
        .collect();

    Ok(DeliveryNoteDetail {
        id: note.id,
        number: note.number,
        project: project.into(),
        client: client.into(),
        creator,
        date: note.date,
        description: note.description,
        hours_entries,
        material_entries: note.material_entries.0,
        is_simple: note.is_simple,
        status: note.status,
        signature: SignatureState {
            is_signed: note.signature_is_signed,
            date: note.signature_date,
            signed_by: note.signature_signed_by,
            content_id: note.signature_content_id,
            image_url: note.signature_image_url,
        },
        pdf: PdfState {
            pending: note.pdf_pending,
            content_id: note.pdf_content_id,
            url: note.pdf_url,
            generated_at: note.pdf_generated_at,
        },
        guest_access: note.guest_access.0,
        created_at: note.created_at,
        updated_at: note.updated_at,
    })
}

#[utoipa::path(
    post,
    path = "/",
    tag = "DeliveryNotes",
    operation_id = "createDeliveryNote",
    summary = "Create a delivery note",
    description = "Issues a new note against one of the caller's projects. The note's client is derived from the project and its number is allocated from a sequential counter; neither can be supplied.",
    request_body = CreateDeliveryNoteRequest,
    responses(
        (status = 201, description = "Delivery note created", body = DeliveryNoteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, project_id = payload.project_id))]
pub async fn create_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDeliveryNoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_delivery_note(&payload)?;

    let now = chrono::Utc::now();

    // Number allocation and the insert share a transaction: the counter's
    // row lock is held until the note is committed, so concurrent creations
    // serialize and numbers are never duplicated or skipped.
    let txn = state.db.begin().await?;

    let project = find_project_for_owner(&txn, payload.project_id, auth_user.user_id).await?;
    let number = numbering::next_number(&txn).await?;

    let hours = HoursEntries(
        payload
            .hours_entries
            .into_iter()
            .map(|e| e.into_entry(now))
            .collect(),
    );
    let materials = MaterialEntries(
        payload
            .material_entries
            .into_iter()
            .map(|e| e.into_entry())
            .collect(),
    );
    let is_simple = compute_is_simple(&hours, &materials);

    let model = delivery_note::ActiveModel {
        project_id: Set(project.id),
        client_id: Set(project.client_id),
        number: Set(number),
        date: Set(payload.date.unwrap_or(now)),
        description: Set(payload.description),
        hours_entries: Set(hours),
        material_entries: Set(materials),
        is_simple: Set(is_simple),
        status: Set(Default::default()),
        signature_is_signed: Set(false),
        pdf_pending: Set(false),
        guest_access: Set(GuestAccess::default()),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(DeliveryNoteResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "DeliveryNotes",
    operation_id = "listDeliveryNotes",
    summary = "List the caller's delivery notes",
    params(DeliveryNoteListQuery),
    responses(
        (status = 200, description = "Delivery notes in creation order", body = [DeliveryNoteResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_delivery_notes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DeliveryNoteListQuery>,
) -> Result<Json<Vec<DeliveryNoteResponse>>, AppError> {
    let mut select = delivery_note::Entity::find()
        .filter(delivery_note::Column::CreatedBy.eq(auth_user.user_id))
        .order_by_asc(delivery_note::Column::Id);

    if let Some(project_id) = query.project_id {
        select = select.filter(delivery_note::Column::ProjectId.eq(project_id));
    }
    if let Some(client_id) = query.client_id {
        select = select.filter(delivery_note::Column::ClientId.eq(client_id));
    }
    if let Some(status) = query.status {
        select = select.filter(delivery_note::Column::Status.eq(status));
    }
    if let Some(is_signed) = query.is_signed {
        select = select.filter(delivery_note::Column::SignatureIsSigned.eq(is_signed));
    }

    let notes = select.all(&state.db).await?;
    Ok(Json(notes.into_iter().map(DeliveryNoteResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "DeliveryNotes",
    operation_id = "getDeliveryNote",
    summary = "Get one delivery note with resolved references",
    description = "Creator only. Returns the note with project, client, creator, and per-line users resolved.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    responses(
        (status = 200, description = "Delivery note detail", body = DeliveryNoteDetail),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Delivery note not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn get_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeliveryNoteDetail>, AppError> {
    let note = find_note_for_owner(&state.db, id, auth_user.user_id).await?;
    let detail = resolve_detail(&state.db, note).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "DeliveryNotes",
    operation_id = "updateDeliveryNote",
    summary = "Update a delivery note",
    description = "PATCH semantics, creator only. Entry lists are replaced wholesale when present and `is_simple` is recomputed. Re-associating the project re-derives the client. The number never changes. Signed notes stay editable; the signature binds the artifact pinned at signing time, not later revisions.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    request_body = UpdateDeliveryNoteRequest,
    responses(
        (status = 200, description = "Delivery note updated", body = DeliveryNoteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Note or project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateDeliveryNoteRequest>,
) -> Result<Json<DeliveryNoteResponse>, AppError> {
    validate_update_delivery_note(&payload)?;

    let now = chrono::Utc::now();
    let model = find_note_for_owner(&state.db, id, auth_user.user_id).await?;

    let mut hours = model.hours_entries.clone();
    let mut materials = model.material_entries.clone();

    let mut active: delivery_note::ActiveModel = model.into();

    if let Some(project_id) = payload.project_id {
        let project = find_project_for_owner(&state.db, project_id, auth_user.user_id).await?;
        active.project_id = Set(project.id);
        active.client_id = Set(project.client_id);
    }
    if let Some(date) = payload.date {
        active.date = Set(date);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(entries) = payload.hours_entries {
        hours = HoursEntries(entries.into_iter().map(|e| e.into_entry(now)).collect());
        active.hours_entries = Set(hours.clone());
    }
    if let Some(entries) = payload.material_entries {
        materials = MaterialEntries(entries.into_iter().map(|e| e.into_entry()).collect());
        active.material_entries = Set(materials.clone());
    }
    active.is_simple = Set(compute_is_simple(&hours, &materials));
    active.updated_at = Set(now);

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "DeliveryNotes",
    operation_id = "changeDeliveryNoteStatus",
    summary = "Change a note's billing status",
    description = "Creator only. Any status can be set from any status; there is no forced ordering.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = DeliveryNoteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Delivery note not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn change_delivery_note_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ChangeStatusRequest>,
) -> Result<Json<DeliveryNoteResponse>, AppError> {
    let model = find_note_for_owner(&state.db, id, auth_user.user_id).await?;
    let mut active: delivery_note::ActiveModel = model.into();
    active.status = Set(payload.status);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/guests",
    tag = "DeliveryNotes",
    operation_id = "addDeliveryNoteGuest",
    summary = "Grant a registered user guest access to a note",
    description = "Creator only. Granting access to a user who already has it is a no-op and reports GUEST_ALREADY_HAS_ACCESS.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    request_body = AddGuestRequest,
    responses(
        (status = 200, description = "Guest access state", body = AddGuestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Note or guest user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id, guest_id = payload.guest_id))]
pub async fn add_delivery_note_guest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AddGuestRequest>,
) -> Result<Json<AddGuestResponse>, AppError> {
    let model = find_note_for_owner(&state.db, id, auth_user.user_id).await?;

    user::Entity::find_by_id(payload.guest_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.guest_id)))?;

    if model.guest_access.contains(payload.guest_id) {
        return Ok(Json(AddGuestResponse {
            message: "GUEST_ALREADY_HAS_ACCESS",
            guest_access: model.guest_access.0,
        }));
    }

    let mut guest_access = model.guest_access.clone();
    guest_access.0.push(payload.guest_id);

    let mut active: delivery_note::ActiveModel = model.into();
    active.guest_access = Set(guest_access.clone());
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(Json(AddGuestResponse {
        message: "GUEST_ACCESS_GRANTED",
        guest_access: guest_access.0,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "DeliveryNotes",
    operation_id = "deleteDeliveryNote",
    summary = "Delete a delivery note unconditionally",
    description = "Creator only. Removes the note regardless of signature state. The allocated number is not reused.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    responses(
        (status = 204, description = "Delivery note deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Delivery note not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let model = find_note_for_owner(&state.db, id, auth_user.user_id).await?;
    delivery_note::Entity::delete_by_id(model.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/safe",
    tag = "DeliveryNotes",
    operation_id = "safeDeleteDeliveryNote",
    summary = "Delete a delivery note unless it is signed",
    description = "Creator only. Refuses with CANNOT_DELETE_SIGNED when the note carries a signature; use the unconditional delete to override.",
    params(("id" = i32, Path, description = "Delivery note ID")),
    responses(
        (status = 204, description = "Delivery note deleted"),
        (status = 400, description = "Note is signed (CANNOT_DELETE_SIGNED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Delivery note not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn safe_delete_delivery_note(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let model = find_note_for_owner(&state.db, id, auth_user.user_id).await?;
    if model.signature_is_signed {
        return Err(AppError::CannotDeleteSigned);
    }
    delivery_note::Entity::delete_by_id(model.id)
        .exec(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
