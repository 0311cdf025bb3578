use sea_orm::sea_query::OnConflict;
use sea_orm::{DbErr, EntityTrait, Set};

use crate::entity::counter;
use crate::utils::numbering;

/// Make sure the numbering counter rows exist so that concurrent first
/// allocations never race on the initial insert.
pub async fn ensure_counters(db: &sea_orm::DatabaseConnection) -> Result<(), DbErr> {
    let row = counter::ActiveModel {
        name: Set(numbering::DELIVERY_NOTE_COUNTER.to_string()),
        value: Set(0),
    };

    counter::Entity::insert(row)
        .on_conflict(
            OnConflict::column(counter::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}
