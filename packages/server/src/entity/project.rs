use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in-progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub description: Option<String>,

    #[sea_orm(belongs_to, from = "client_id", to = "id")]
    pub client: Option<super::client::Entity>,
    pub client_id: i32,

    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub owner: Option<super::user::Entity>,
    pub created_by: i32,

    pub is_archived: bool,
    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub status: ProjectStatus,

    #[sea_orm(has_many)]
    pub delivery_notes: HasMany<super::delivery_note::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
