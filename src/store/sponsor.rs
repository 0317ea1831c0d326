use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, sea_query::Expr,
};
use serde::Serialize;

use crate::entities::{
    prelude::*,
    show_sponsor::{self, Placement},
    sponsor,
};

pub const DEFAULT_SORT_ORDER: i32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct SponsorListing {
    pub id: i32,
    pub name: String,
    pub logo_path: String,
    pub website_url: String,
    pub placement: Placement,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShowSponsors {
    pub title_sponsor: Option<SponsorListing>,
    pub sponsors: Vec<SponsorListing>,
}

/// Creates the sponsor or refreshes its logo and link, keyed by name.
pub async fn upsert_sponsor<C: ConnectionTrait>(
    db: &C,
    name: &str,
    logo_path: &str,
    website_url: &str,
) -> Result<sponsor::Model, DbErr> {
    let existing = Sponsor::find()
        .filter(sponsor::Column::Name.eq(name))
        .one(db)
        .await?;

    match existing {
        Some(existing) => {
            let mut model = existing.into_active_model();
            model.logo_path = Set(logo_path.to_string());
            model.website_url = Set(website_url.to_string());
            model.update(db).await
        }
        None => {
            sponsor::ActiveModel {
                name: Set(name.to_string()),
                logo_path: Set(logo_path.to_string()),
                website_url: Set(website_url.to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    }
}

pub async fn attach_sponsor_to_show<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    sponsor_id: i32,
    placement: Placement,
    sort_order: i32,
) -> Result<show_sponsor::Model, DbErr> {
    let existing = ShowSponsor::find()
        .filter(show_sponsor::Column::ShowId.eq(show_id))
        .filter(show_sponsor::Column::SponsorId.eq(sponsor_id))
        .one(db)
        .await?;

    match existing {
        Some(existing) => {
            let mut model = existing.into_active_model();
            model.placement = Set(placement);
            model.sort_order = Set(sort_order);
            model.update(db).await
        }
        None => {
            show_sponsor::ActiveModel {
                show_id: Set(show_id),
                sponsor_id: Set(sponsor_id),
                placement: Set(placement),
                sort_order: Set(sort_order),
                ..Default::default()
            }
            .insert(db)
            .await
        }
    }
}

/// A show has at most one title sponsor; the previous one becomes standard.
pub async fn set_title_sponsor<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    show_id: i32,
    sponsor_id: i32,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    ShowSponsor::update_many()
        .col_expr(
            show_sponsor::Column::Placement,
            Expr::value(Placement::Standard),
        )
        .filter(show_sponsor::Column::ShowId.eq(show_id))
        .filter(show_sponsor::Column::Placement.eq(Placement::Title))
        .exec(&txn)
        .await?;
    attach_sponsor_to_show(&txn, show_id, sponsor_id, Placement::Title, 0).await?;
    txn.commit().await
}

pub async fn remove_sponsor_from_show<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    sponsor_id: i32,
) -> Result<bool, DbErr> {
    let result = ShowSponsor::delete_many()
        .filter(show_sponsor::Column::ShowId.eq(show_id))
        .filter(show_sponsor::Column::SponsorId.eq(sponsor_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn show_sponsors<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<ShowSponsors, DbErr> {
    let rows = ShowSponsor::find()
        .filter(show_sponsor::Column::ShowId.eq(show_id))
        .order_by_asc(show_sponsor::Column::SortOrder)
        .find_also_related(Sponsor)
        .all(db)
        .await?;

    let mut listings: Vec<SponsorListing> = rows
        .into_iter()
        .filter_map(|(link, sponsor)| {
            sponsor.map(|sponsor| SponsorListing {
                id: sponsor.id,
                name: sponsor.name,
                logo_path: sponsor.logo_path,
                website_url: sponsor.website_url,
                placement: link.placement,
                sort_order: link.sort_order,
            })
        })
        .collect();
    listings.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));

    let title_sponsor = listings
        .iter()
        .position(|s| s.placement == Placement::Title)
        .map(|index| listings.remove(index));

    Ok(ShowSponsors {
        title_sponsor,
        sponsors: listings,
    })
}
