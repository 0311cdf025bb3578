use chrono::{Datelike, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, QuerySelect, Set};

use crate::entity::counter;
use crate::error::AppError;

/// Counter row backing delivery note numbering. One global sequence across
/// owners and years (observed behavior of the numbering scheme).
pub const DELIVERY_NOTE_COUNTER: &str = "delivery_note";

/// Format a delivery note number: `ALB-<year>-<4-digit zero-padded seq>`.
///
/// Sequences above 9999 widen naturally instead of wrapping.
pub fn format_number(year: i32, seq: i64) -> String {
    format!("ALB-{year}-{seq:04}")
}

/// Allocate the next delivery note number inside the caller's transaction.
///
/// The counter row is locked `FOR UPDATE` until the transaction commits, so
/// two concurrent creations cannot observe the same sequence value.
pub async fn next_number(txn: &DatabaseTransaction) -> Result<String, AppError> {
    let seq = next_value(txn, DELIVERY_NOTE_COUNTER).await?;
    Ok(format_number(Utc::now().year(), seq))
}

async fn next_value(txn: &DatabaseTransaction, name: &str) -> Result<i64, AppError> {
    let row = counter::Entity::find_by_id(name)
        .lock(LockType::Update)
        .one(txn)
        .await?;

    match row {
        Some(model) => {
            let next = model
                .value
                .checked_add(1)
                .ok_or_else(|| AppError::Internal(format!("counter '{name}' overflow")))?;
            let mut active: counter::ActiveModel = model.into();
            active.value = Set(next);
            active.update(txn).await?;
            Ok(next)
        }
        // Seeded at startup; reachable only against a database that skipped
        // seed::ensure_counters.
        None => {
            let active = counter::ActiveModel {
                name: Set(name.to_string()),
                value: Set(1),
            };
            active.insert(txn).await?;
            Ok(1)
        }
    }
}
