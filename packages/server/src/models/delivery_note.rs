use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_optional_description};
use crate::entity::delivery_note::{
    DeliveryNoteStatus, HoursEntries, HoursEntry, MaterialEntries, MaterialEntry,
};
use crate::entity::project::ProjectStatus;
use crate::error::AppError;

/// Default unit for material lines when the caller omits one.
pub const DEFAULT_MATERIAL_UNIT: &str = "unidad";

/// Labor line as submitted by clients. `date` defaults to the request time.
#[derive(Deserialize, Clone, utoipa::ToSchema)]
pub struct HoursEntryInput {
    /// User the hours are attributed to. Not required to be the caller.
    pub user_id: i32,
    pub hours: f64,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl HoursEntryInput {
    pub fn into_entry(self, now: DateTime<Utc>) -> HoursEntry {
        HoursEntry {
            user_id: self.user_id,
            hours: self.hours,
            description: self.description,
            date: self.date.unwrap_or(now),
        }
    }
}

/// Material line as submitted by clients. `unit` defaults to "unidad".
#[derive(Deserialize, Clone, utoipa::ToSchema)]
pub struct MaterialEntryInput {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl MaterialEntryInput {
    pub fn into_entry(self) -> MaterialEntry {
        MaterialEntry {
            name: self.name,
            quantity: self.quantity,
            unit: self.unit.unwrap_or_else(|| DEFAULT_MATERIAL_UNIT.into()),
            price: self.price,
            description: self.description,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDeliveryNoteRequest {
    /// Project this note is issued against; must be owned by the caller.
    /// The note's client is derived from the project, never supplied.
    pub project_id: i32,
    /// Document date; defaults to the request time.
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    #[serde(default)]
    pub hours_entries: Vec<HoursEntryInput>,
    #[serde(default)]
    pub material_entries: Vec<MaterialEntryInput>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateDeliveryNoteRequest {
    /// Re-associating the project re-derives the client.
    pub project_id: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub hours_entries: Option<Vec<HoursEntryInput>>,
    pub material_entries: Option<Vec<MaterialEntryInput>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangeStatusRequest {
    pub status: DeliveryNoteStatus,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddGuestRequest {
    /// Registered user to grant read/sign access.
    pub guest_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AddGuestResponse {
    #[schema(example = "GUEST_ACCESS_GRANTED")]
    pub message: &'static str,
    pub guest_access: Vec<i32>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct DeliveryNoteListQuery {
    pub project_id: Option<i32>,
    pub client_id: Option<i32>,
    pub status: Option<DeliveryNoteStatus>,
    pub is_signed: Option<bool>,
}

/// Signature sub-state as exposed to clients.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignatureState {
    pub is_signed: bool,
    pub date: Option<DateTime<Utc>>,
    pub signed_by: Option<String>,
    pub content_id: Option<String>,
    pub image_url: Option<String>,
}

/// Pinned-PDF sub-state. `pending` stays raised until the post-sign pin
/// task succeeds.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PdfState {
    pub pending: bool,
    pub content_id: Option<String>,
    pub url: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeliveryNoteResponse {
    pub id: i32,
    pub number: String,
    pub project_id: i32,
    pub client_id: i32,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub hours_entries: Vec<HoursEntry>,
    pub material_entries: Vec<MaterialEntry>,
    pub is_simple: bool,
    pub status: DeliveryNoteStatus,
    pub signature: SignatureState,
    pub pdf: PdfState,
    pub guest_access: Vec<i32>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::delivery_note::Model> for DeliveryNoteResponse {
    fn from(m: crate::entity::delivery_note::Model) -> Self {
        Self {
            id: m.id,
            number: m.number,
            project_id: m.project_id,
            client_id: m.client_id,
            date: m.date,
            description: m.description,
            hours_entries: m.hours_entries.0,
            material_entries: m.material_entries.0,
            is_simple: m.is_simple,
            status: m.status,
            signature: SignatureState {
                is_signed: m.signature_is_signed,
                date: m.signature_date,
                signed_by: m.signature_signed_by,
                content_id: m.signature_content_id,
                image_url: m.signature_image_url,
            },
            pdf: PdfState {
                pending: m.pdf_pending,
                content_id: m.pdf_content_id,
                url: m.pdf_url,
                generated_at: m.pdf_generated_at,
            },
            guest_access: m.guest_access.0,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<crate::entity::user::Model> for UserSummary {
    fn from(m: crate::entity::user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClientSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub nif: Option<String>,
    pub address: Option<String>,
}

impl From<crate::entity::client::Model> for ClientSummary {
    fn from(m: crate::entity::client::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            nif: m.nif,
            address: m.address,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectSummary {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
}

impl From<crate::entity::project::Model> for ProjectSummary {
    fn from(m: crate::entity::project::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            status: m.status,
        }
    }
}

/// Labor line with the referenced user resolved, when the user still exists.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HoursEntryDetail {
    pub user_id: i32,
    pub user: Option<UserSummary>,
    pub hours: f64,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// Full detail view: the note plus its resolved project, client, creator,
/// and per-line users. Also the input to PDF rendering.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeliveryNoteDetail {
    pub id: i32,
    pub number: String,
    pub project: ProjectSummary,
    pub client: ClientSummary,
    pub creator: Option<UserSummary>,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub hours_entries: Vec<HoursEntryDetail>,
    pub material_entries: Vec<MaterialEntry>,
    pub is_simple: bool,
    pub status: DeliveryNoteStatus,
    pub signature: SignatureState,
    pub pdf: PdfState,
    pub guest_access: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note is "simple" when it carries at most one line of each kind.
pub fn compute_is_simple(hours: &HoursEntries, materials: &MaterialEntries) -> bool {
    hours.0.len() <= 1 && materials.0.len() <= 1
}

pub fn validate_create_delivery_note(req: &CreateDeliveryNoteRequest) -> Result<(), AppError> {
    validate_optional_description(req.description.as_deref())?;
    validate_hours_inputs(&req.hours_entries)?;
    validate_material_inputs(&req.material_entries)
}

pub fn validate_update_delivery_note(req: &UpdateDeliveryNoteRequest) -> Result<(), AppError> {
    if let Some(Some(ref desc)) = req.description {
        validate_optional_description(Some(desc))?;
    }
    if let Some(ref hours) = req.hours_entries {
        validate_hours_inputs(hours)?;
    }
    if let Some(ref materials) = req.material_entries {
        validate_material_inputs(materials)?;
    }
    Ok(())
}

fn validate_hours_inputs(entries: &[HoursEntryInput]) -> Result<(), AppError> {
    for entry in entries {
        if !entry.hours.is_finite() || entry.hours < 0.0 {
            return Err(AppError::Validation(
                "Hours must be a non-negative number".into(),
            ));
        }
        validate_optional_description(entry.description.as_deref())?;
    }
    Ok(())
}

fn validate_material_inputs(entries: &[MaterialEntryInput]) -> Result<(), AppError> {
    for entry in entries {
        if entry.name.trim().is_empty() || entry.name.chars().count() > 256 {
            return Err(AppError::Validation(
                "Material name must be 1-256 characters".into(),
            ));
        }
        if !entry.quantity.is_finite() || entry.quantity < 0.0 {
            return Err(AppError::Validation(
                "Material quantity must be a non-negative number".into(),
            ));
        }
        if let Some(price) = entry.price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(AppError::Validation(
                "Material price must be a non-negative number".into(),
            ));
        }
        validate_optional_description(entry.description.as_deref())?;
    }
    Ok(())
}
