use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    entities::{prelude::*, show},
    error::AppError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewShow {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub date_text: String,
    #[serde(default)]
    pub time_text: String,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub benefiting: String,
    #[serde(default)]
    pub suggested_donation: String,
    #[serde(default)]
    pub description: String,
}

/// Seeded on first start so the site is usable before an admin creates anything.
pub fn default_show() -> NewShow {
    NewShow {
        slug: "karman-charity-show".into(),
        title: "Karman Charity Car Show".into(),
        date_text: "Saturday, April 26, 2026".into(),
        time_text: "Cars arrive at 10:00 AM".into(),
        location_name: "Children’s Mercy Park".into(),
        address: "1 Sporting Way, Kansas City, KS 66111".into(),
        benefiting: "Saving22 / 22 Survivor Awareness".into(),
        suggested_donation: "$35 suggested donation for show cars".into(),
        description: "A charity car show supporting veteran suicide awareness with judged \
                      certificates by branch favorites and People’s Choice."
            .into(),
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub async fn get_active_show<C: ConnectionTrait>(db: &C) -> Result<Option<show::Model>, DbErr> {
    Show::find()
        .filter(show::Column::IsActive.eq(true))
        .order_by_asc(show::Column::Id)
        .one(db)
        .await
}

pub async fn get_show<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Option<show::Model>, DbErr> {
    Show::find_by_id(show_id).one(db).await
}

pub async fn get_show_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<show::Model>, DbErr> {
    Show::find()
        .filter(show::Column::Slug.eq(slug))
        .one(db)
        .await
}

pub async fn list_shows<C: ConnectionTrait>(db: &C) -> Result<Vec<show::Model>, DbErr> {
    Show::find().order_by_desc(show::Column::Id).all(db).await
}

pub async fn create_show<C: ConnectionTrait>(
    db: &C,
    new: NewShow,
) -> Result<show::Model, AppError> {
    let slug = new.slug.trim().to_lowercase();
    let title = new.title.trim().to_string();
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits and dashes.".into(),
        ));
    }
    if title.is_empty() {
        return Err(AppError::BadRequest("Show title is required.".into()));
    }
    if get_show_by_slug(db, &slug).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "A show with slug '{slug}' already exists."
        )));
    }

    let model = show::ActiveModel {
        slug: Set(slug),
        title: Set(title),
        date_text: Set(new.date_text),
        time_text: Set(new.time_text),
        location_name: Set(new.location_name),
        address: Set(new.address),
        benefiting: Set(new.benefiting),
        suggested_donation: Set(new.suggested_donation),
        description: Set(new.description),
        is_active: Set(false),
        voting_open: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Makes `show_id` the only active show.
pub async fn activate_show<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    show_id: i32,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    Show::update_many()
        .col_expr(show::Column::IsActive, Expr::value(false))
        .filter(show::Column::Id.ne(show_id))
        .exec(&txn)
        .await?;
    Show::update_many()
        .col_expr(show::Column::IsActive, Expr::value(true))
        .filter(show::Column::Id.eq(show_id))
        .exec(&txn)
        .await?;
    txn.commit().await
}

pub async fn ensure_default_show<C: ConnectionTrait + TransactionTrait>(
    db: &C,
) -> Result<(), AppError> {
    if Show::find().count(db).await? > 0 {
        return Ok(());
    }
    let show = create_show(db, default_show()).await?;
    activate_show(db, show.id).await?;
    info!("Seeded default show '{}'", show.slug);
    Ok(())
}

pub async fn set_voting_open<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    open: bool,
) -> Result<(), DbErr> {
    Show::update_many()
        .col_expr(show::Column::VotingOpen, Expr::value(open))
        .filter(show::Column::Id.eq(show_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Flips the voting gate and returns the new state.
pub async fn toggle_voting<C: ConnectionTrait>(db: &C, show: show::Model) -> Result<bool, DbErr> {
    let open = !show.voting_open;
    let mut model = show.into_active_model();
    model.voting_open = Set(open);
    model.update(db).await?;
    Ok(open)
}

/// Closes voting on the active show once `voting_end` has passed.
/// Returns true when this call closed it.
pub async fn close_voting_if_past<C: ConnectionTrait>(
    db: &C,
    voting_end: DateTime<FixedOffset>,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    if now < voting_end {
        return Ok(false);
    }
    let Some(show) = get_active_show(db).await? else {
        return Ok(false);
    };
    if !show.voting_open {
        return Ok(false);
    }
    set_voting_open(db, show.id, false).await?;
    info!("Voting end passed, closed voting for '{}'", show.slug);
    Ok(true)
}
