use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::project;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::client::find_client_for_owner;
use crate::models::project::{
    CreateProjectRequest, ProjectListQuery, ProjectResponse, UpdateProjectRequest,
    validate_create_project, validate_date_range, validate_update_project,
};
use crate::state::AppState;

/// Fetch a project owned by `user_id`. Absent and not-owned are both
/// `NOT_FOUND`.
pub async fn find_project_for_owner<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .filter(project::Column::CreatedBy.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project under one of the caller's clients",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_project(&payload)?;

    // The client must exist and belong to the caller.
    find_client_for_owner(&state.db, payload.client_id, auth_user.user_id).await?;

    let now = chrono::Utc::now();
    let model = project::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        client_id: Set(payload.client_id),
        created_by: Set(auth_user.user_id),
        is_archived: Set(false),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        status: Set(payload.status.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List the caller's projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projects", body = [ProjectResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_projects(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let mut select = project::Entity::find()
        .filter(project::Column::CreatedBy.eq(auth_user.user_id))
        .order_by_asc(project::Column::Id);

    if let Some(client_id) = query.client_id {
        select = select.filter(project::Column::ClientId.eq(client_id));
    }
    if !query.include_archived.unwrap_or(false) {
        select = select.filter(project::Column::IsArchived.eq(false));
    }

    let projects = select.all(&state.db).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get one project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn get_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    let model = find_project_for_owner(&state.db, id, auth_user.user_id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Update a project",
    description = "PATCH semantics. Re-assigning `client_id` requires the new client to be owned by the caller.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project or client not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    validate_update_project(&payload)?;

    let model = find_project_for_owner(&state.db, id, auth_user.user_id).await?;

    if let Some(client_id) = payload.client_id {
        find_client_for_owner(&state.db, client_id, auth_user.user_id).await?;
    }

    // Range check against the values that will actually be stored.
    let effective_start = match payload.start_date {
        Some(opt) => opt,
        None => model.start_date,
    };
    let effective_end = match payload.end_date {
        Some(opt) => opt,
        None => model.end_date,
    };
    validate_date_range(effective_start, effective_end)?;

    let mut active: project::ActiveModel = model.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(client_id) = payload.client_id {
        active.client_id = Set(client_id);
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project permanently",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let model = find_project_for_owner(&state.db, id, auth_user.user_id).await?;
    project::Entity::delete_by_id(model.id).exec(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/{id}/archive",
    tag = "Projects",
    operation_id = "archiveProject",
    summary = "Archive a project (soft delete)",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project archived", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn archive_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    set_archived(&state, id, auth_user.user_id, true).await
}

#[utoipa::path(
    patch,
    path = "/{id}/restore",
    tag = "Projects",
    operation_id = "restoreProject",
    summary = "Restore an archived project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project restored", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn restore_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    set_archived(&state, id, auth_user.user_id, false).await
}

async fn set_archived(
    state: &AppState,
    id: i32,
    user_id: i32,
    archived: bool,
) -> Result<Json<ProjectResponse>, AppError> {
    let model = find_project_for_owner(&state.db, id, user_id).await?;
    let mut active: project::ActiveModel = model.into();
    active.is_archived = Set(archived);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}
