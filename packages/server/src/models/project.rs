use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_name, validate_optional_description};
use crate::entity::project::ProjectStatus;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProjectRequest {
    #[schema(example = "Reforma nave industrial")]
    pub name: String,
    pub description: Option<String>,
    /// Client this project belongs to; must be owned by the caller.
    pub client_id: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub client_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<ProjectStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub client_id: i32,
    pub is_archived: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::project::Model> for ProjectResponse {
    fn from(m: crate::entity::project::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            client_id: m.client_id,
            is_archived: m.is_archived,
            start_date: m.start_date,
            end_date: m.end_date,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProjectListQuery {
    /// Restrict to projects of one client.
    pub client_id: Option<i32>,
    /// Include archived projects (default false).
    pub include_archived: Option<bool>,
}

pub fn validate_create_project(req: &CreateProjectRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Project name")?;
    validate_optional_description(req.description.as_deref())?;
    validate_date_range(req.start_date, req.end_date)
}

pub fn validate_update_project(req: &UpdateProjectRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name, "Project name")?;
    }
    if let Some(Some(ref desc)) = req.description {
        validate_optional_description(Some(desc))?;
    }
    // Cross-field range check only when both ends arrive in one request;
    // the handler re-checks against stored values.
    if let (Some(Some(start)), Some(Some(end))) = (req.start_date, req.end_date) {
        validate_date_range(Some(start), Some(end))?;
    }
    Ok(())
}

pub fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(AppError::Validation(
            "End date must not precede start date".into(),
        ));
    }
    Ok(())
}
