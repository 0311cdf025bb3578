use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_email, validate_name};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateClientRequest {
    #[schema(example = "Construcciones Pérez S.L.")]
    pub name: String,
    #[schema(example = "facturacion@cperez.es")]
    pub email: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    /// Spanish tax identification number.
    pub nif: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nif: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClientResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub nif: Option<String>,
    pub address: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::client::Model> for ClientResponse {
    fn from(m: crate::entity::client::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            contact_person: m.contact_person,
            nif: m.nif,
            address: m.address,
            is_archived: m.is_archived,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ClientListQuery {
    /// Include archived clients (default false).
    pub include_archived: Option<bool>,
}

pub fn validate_create_client(req: &CreateClientRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Client name")?;
    validate_email(&req.email)?;
    Ok(())
}

pub fn validate_update_client(req: &UpdateClientRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name, "Client name")?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    Ok(())
}
