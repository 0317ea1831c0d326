use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
    sea_query::Expr,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::categories::CATEGORIES;
use crate::entities::{prelude::*, show, show_car, vote};

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct CarCategoryTotal {
    pub show_car_id: i32,
    pub category: String,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub show_car_id: i32,
    pub car_number: i32,
    pub year: String,
    pub make: String,
    pub model: String,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBoard {
    pub category: String,
    pub entries: Vec<LeaderboardEntry>,
}

/// Vote totals for one show. Cars without votes are left out of every board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    /// Voting is closed, so the standings will not change.
    pub is_final: bool,
    pub by_category: Vec<CategoryBoard>,
    pub overall: Vec<LeaderboardEntry>,
    pub total_votes: i64,
}

pub async fn totals_by_car_and_category<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<CarCategoryTotal>, DbErr> {
    Vote::find()
        .select_only()
        .column(vote::Column::ShowCarId)
        .column(vote::Column::Category)
        .column_as(Expr::col(vote::Column::VoteQty).sum(), "total_votes")
        .filter(vote::Column::ShowId.eq(show_id))
        .group_by(vote::Column::ShowCarId)
        .group_by(vote::Column::Category)
        .into_model::<CarCategoryTotal>()
        .all(db)
        .await
}

fn category_rank(category: &str) -> usize {
    CATEGORIES
        .iter()
        .position(|c| c.name == category)
        .unwrap_or(CATEGORIES.len())
}

fn rank(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.total_votes
            .cmp(&a.total_votes)
            .then(a.car_number.cmp(&b.car_number))
    });
}

pub fn build_leaderboard(
    voting_open: bool,
    totals: &[CarCategoryTotal],
    cars: &[show_car::Model],
) -> Leaderboard {
    let cars: HashMap<i32, &show_car::Model> = cars.iter().map(|car| (car.id, car)).collect();
    let entry = |show_car_id: i32, total_votes: i64| {
        let car = cars.get(&show_car_id);
        LeaderboardEntry {
            show_car_id,
            car_number: car.map(|c| c.car_number).unwrap_or_default(),
            year: car.map(|c| c.year.clone()).unwrap_or_default(),
            make: car.map(|c| c.make.clone()).unwrap_or_default(),
            model: car.map(|c| c.model.clone()).unwrap_or_default(),
            total_votes,
        }
    };

    let mut by_category: BTreeMap<(usize, &str), Vec<LeaderboardEntry>> = BTreeMap::new();
    let mut overall: BTreeMap<i32, i64> = BTreeMap::new();
    for total in totals.iter().filter(|t| t.total_votes > 0) {
        by_category
            .entry((category_rank(&total.category), total.category.as_str()))
            .or_default()
            .push(entry(total.show_car_id, total.total_votes));
        *overall.entry(total.show_car_id).or_default() += total.total_votes;
    }

    let by_category = by_category
        .into_iter()
        .map(|((_, category), mut entries)| {
            rank(&mut entries);
            CategoryBoard {
                category: category.to_string(),
                entries,
            }
        })
        .collect();

    let mut overall: Vec<LeaderboardEntry> = overall
        .into_iter()
        .map(|(show_car_id, total)| entry(show_car_id, total))
        .collect();
    rank(&mut overall);
    let total_votes = overall.iter().map(|e| e.total_votes).sum();

    Leaderboard {
        is_final: !voting_open,
        by_category,
        overall,
        total_votes,
    }
}

pub async fn leaderboard_for_show<C: ConnectionTrait>(
    db: &C,
    show: &show::Model,
) -> Result<Leaderboard, DbErr> {
    let totals = totals_by_car_and_category(db, show.id).await?;
    let cars = ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show.id))
        .all(db)
        .await?;
    Ok(build_leaderboard(show.voting_open, &totals, &cars))
}
