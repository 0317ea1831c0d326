use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};

use crate::entities::{prelude::*, vote};

pub async fn find_by_session<C: ConnectionTrait>(
    db: &C,
    stripe_session_id: &str,
) -> Result<Option<vote::Model>, DbErr> {
    Vote::find()
        .filter(vote::Column::StripeSessionId.eq(stripe_session_id))
        .one(db)
        .await
}

pub async fn count_for_session<C: ConnectionTrait>(
    db: &C,
    stripe_session_id: &str,
) -> Result<u64, DbErr> {
    Vote::find()
        .filter(vote::Column::StripeSessionId.eq(stripe_session_id))
        .count(db)
        .await
}

/// Single-statement insert guarded by the unique session id. Returns false when
/// a row for the session already existed, which is not an error.
pub async fn insert_once<C: ConnectionTrait>(
    db: &C,
    model: vote::ActiveModel,
) -> Result<bool, DbErr> {
    let rows = Vote::insert(model)
        .on_conflict(
            OnConflict::column(vote::Column::StripeSessionId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(rows > 0)
}

pub async fn votes_for_show<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<vote::Model>, DbErr> {
    Vote::find()
        .filter(vote::Column::ShowId.eq(show_id))
        .order_by_asc(vote::Column::Id)
        .all(db)
        .await
}

pub async fn reset_votes_for_show<C: ConnectionTrait>(db: &C, show_id: i32) -> Result<u64, DbErr> {
    let result = Vote::delete_many()
        .filter(vote::Column::ShowId.eq(show_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
