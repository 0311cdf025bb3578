use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 hash, never the raw password.
    pub password: String,
    pub name: String,

    #[sea_orm(has_many)]
    pub clients: HasMany<super::client::Entity>,

    #[sea_orm(has_many)]
    pub projects: HasMany<super::project::Entity>,

    #[sea_orm(has_many)]
    pub delivery_notes: HasMany<super::delivery_note::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
