use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing status, freely settable by the owner. Independent of the
/// signature sub-state; no forward-only ordering is enforced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryNoteStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "invoiced")]
    Invoiced,
}

impl Default for DeliveryNoteStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// One labor line: hours worked by one user against the note's project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HoursEntry {
    pub user_id: i32,
    pub hours: f64,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// One material line delivered against the note's project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MaterialEntry {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price: Option<f64>,
    pub description: Option<String>,
}

#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult,
    utoipa::ToSchema,
)]
pub struct HoursEntries(pub Vec<HoursEntry>);

#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult,
    utoipa::ToSchema,
)]
pub struct MaterialEntries(pub Vec<MaterialEntry>);

/// User ids granted read/sign access beyond the owner. Append-only through
/// the guest endpoint, deduplicated.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult,
    utoipa::ToSchema,
)]
pub struct GuestAccess(pub Vec<i32>);

impl GuestAccess {
    pub fn contains(&self, user_id: i32) -> bool {
        self.0.contains(&user_id)
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_note")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: Option<super::project::Entity>,
    pub project_id: i32,

    /// Always the client of the referenced project as of the last project
    /// association; never supplied by callers.
    #[sea_orm(belongs_to, from = "client_id", to = "id")]
    pub client: Option<super::client::Entity>,
    pub client_id: i32,

    /// Human-readable sequential code, e.g. `ALB-2025-0001`. Assigned once at
    /// creation, never reassigned.
    #[sea_orm(unique)]
    pub number: String,

    pub date: DateTimeUtc,
    pub description: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub hours_entries: HoursEntries,
    #[sea_orm(column_type = "JsonBinary")]
    pub material_entries: MaterialEntries,

    /// Derived: at most one hours entry AND at most one material entry.
    pub is_simple: bool,

    pub status: DeliveryNoteStatus,

    // Signature sub-state. Write-once: set through a conditional update that
    // requires signature_is_signed to still be false.
    pub signature_is_signed: bool,
    pub signature_date: Option<DateTimeUtc>,
    pub signature_signed_by: Option<String>,
    pub signature_content_id: Option<String>,
    pub signature_image_url: Option<String>,

    // Pinned-PDF sub-state. pdf_pending is raised together with the signature
    // and lowered by the follow-up pin task; a task failure leaves it raised.
    pub pdf_pending: bool,
    pub pdf_content_id: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_generated_at: Option<DateTimeUtc>,

    #[sea_orm(column_type = "JsonBinary")]
    pub guest_access: GuestAccess,

    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub creator: Option<super::user::Entity>,
    pub created_by: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
