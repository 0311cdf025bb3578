use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    /// Spanish tax identification number.
    pub nif: Option<String>,
    pub address: Option<String>,

    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub owner: Option<super::user::Entity>,
    pub created_by: i32,

    pub is_archived: bool,

    #[sea_orm(has_many)]
    pub projects: HasMany<super::project::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
