use std::sync::Arc;

use common::ContentStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::pdf::DocumentRenderer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub content_store: Arc<dyn ContentStore>,
    pub renderer: Arc<DocumentRenderer>,
}
