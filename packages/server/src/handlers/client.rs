use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::client;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::client::{
    ClientListQuery, ClientResponse, CreateClientRequest, UpdateClientRequest,
    validate_create_client, validate_update_client,
};
use crate::state::AppState;

/// Fetch a client owned by `user_id`. Absent and not-owned are both
/// `NOT_FOUND` so callers cannot probe other users' client ids.
pub async fn find_client_for_owner<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<client::Model, AppError> {
    client::Entity::find_by_id(id)
        .filter(client::Column::CreatedBy.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Clients",
    operation_id = "createClient",
    summary = "Create a client",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_client(&payload)?;

    let now = chrono::Utc::now();
    let model = client::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        phone: Set(payload.phone),
        contact_person: Set(payload.contact_person),
        nif: Set(payload.nif),
        address: Set(payload.address),
        created_by: Set(auth_user.user_id),
        is_archived: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ClientResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Clients",
    operation_id = "listClients",
    summary = "List the caller's clients",
    params(ClientListQuery),
    responses(
        (status = 200, description = "Clients", body = [ClientResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_clients(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let mut select = client::Entity::find()
        .filter(client::Column::CreatedBy.eq(auth_user.user_id))
        .order_by_asc(client::Column::Id);

    if !query.include_archived.unwrap_or(false) {
        select = select.filter(client::Column::IsArchived.eq(false));
    }

    let clients = select.all(&state.db).await?;
    Ok(Json(clients.into_iter().map(ClientResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Clients",
    operation_id = "getClient",
    summary = "Get one client",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = ClientResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn get_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClientResponse>, AppError> {
    let model = find_client_for_owner(&state.db, id, auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Clients",
    operation_id = "updateClient",
    summary = "Update a client",
    description = "PATCH semantics: only provided fields change; nullable fields accept explicit null to clear.",
    params(("id" = i32, Path, description = "Client ID")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    validate_update_client(&payload)?;

    let model = find_client_for_owner(&state.db, id, auth_user.user_id).await?;
    let mut active: client::ActiveModel = model.into();

    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(contact_person) = payload.contact_person {
        active.contact_person = Set(contact_person);
    }
    if let Some(nif) = payload.nif {
        active.nif = Set(nif);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Clients",
    operation_id = "deleteClient",
    summary = "Delete a client permanently",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let model = find_client_for_owner(&state.db, id, auth_user.user_id).await?;
    client::Entity::delete_by_id(model.id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/{id}/archive",
    tag = "Clients",
    operation_id = "archiveClient",
    summary = "Archive a client (soft delete)",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client archived", body = ClientResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn archive_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClientResponse>, AppError> {
    set_archived(&state, id, auth_user.user_id, true).await
}

#[utoipa::path(
    patch,
    path = "/{id}/restore",
    tag = "Clients",
    operation_id = "restoreClient",
    summary = "Restore an archived client",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client restored", body = ClientResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn restore_client(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClientResponse>, AppError> {
    set_archived(&state, id, auth_user.user_id, false).await
}

async fn set_archived(
    state: &AppState,
    id: i32,
    user_id: i32,
    archived: bool,
) -> Result<Json<ClientResponse>, AppError> {
    let model = find_client_for_owner(&state.db, id, user_id).await?;
    let mut active: client::ActiveModel = model.into();
    active.is_archived = Set(archived);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}
