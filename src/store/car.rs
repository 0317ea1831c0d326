use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    entities::{person, prelude::*, show_car},
    error::AppError,
};

pub const MAX_PLACEHOLDERS_PER_BATCH: i32 = 1000;

/// Owner and car fields captured at registration or check-in.
#[derive(Debug, Clone)]
pub struct OwnerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub opt_in_future: bool,
}

#[derive(Debug, Clone)]
pub struct CarDetails {
    pub year: String,
    pub make: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarWithOwner {
    #[serde(flatten)]
    pub car: show_car::Model,
    pub owner: Option<person::Model>,
}

pub fn new_car_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub async fn create_person<C: ConnectionTrait>(
    db: &C,
    owner: &OwnerDetails,
) -> Result<person::Model, DbErr> {
    let now = Utc::now();
    person::ActiveModel {
        name: Set(owner.name.clone()),
        phone: Set(owner.phone.clone()),
        email: Set(owner.email.clone()),
        opt_in_future: Set(owner.opt_in_future),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn update_person<C: ConnectionTrait>(
    db: &C,
    existing: person::Model,
    owner: &OwnerDetails,
) -> Result<person::Model, DbErr> {
    let mut model = existing.into_active_model();
    model.name = Set(owner.name.clone());
    model.phone = Set(owner.phone.clone());
    model.email = Set(owner.email.clone());
    model.opt_in_future = Set(owner.opt_in_future);
    model.updated_at = Set(Utc::now());
    model.update(db).await
}

pub async fn find_by_token<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    car_token: &str,
) -> Result<Option<show_car::Model>, DbErr> {
    ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show_id))
        .filter(show_car::Column::CarToken.eq(car_token))
        .one(db)
        .await
}

pub async fn find_with_owner<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    car_token: &str,
) -> Result<Option<CarWithOwner>, DbErr> {
    let found = ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show_id))
        .filter(show_car::Column::CarToken.eq(car_token))
        .find_also_related(Person)
        .one(db)
        .await?;
    Ok(found.map(|(car, owner)| CarWithOwner { car, owner }))
}

pub async fn find_by_number<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    car_number: i32,
) -> Result<Option<show_car::Model>, DbErr> {
    ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show_id))
        .filter(show_car::Column::CarNumber.eq(car_number))
        .one(db)
        .await
}

pub async fn list_show_cars<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
) -> Result<Vec<CarWithOwner>, DbErr> {
    let rows = ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show_id))
        .order_by_asc(show_car::Column::CarNumber)
        .find_also_related(Person)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(car, owner)| CarWithOwner { car, owner })
        .collect())
}

fn new_car(show_id: i32, person_id: Option<i32>, car_number: i32) -> show_car::ActiveModel {
    let now = Utc::now();
    show_car::ActiveModel {
        show_id: Set(show_id),
        person_id: Set(person_id),
        car_number: Set(car_number),
        car_token: Set(new_car_token()),
        year: Set(String::new()),
        make: Set(String::new()),
        model: Set(String::new()),
        waiver_received: Set(false),
        waiver_received_at: Set(None),
        waiver_received_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

/// Direct registration: a new owner and a new car number in one go.
pub async fn register_car<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    show_id: i32,
    car_number: i32,
    owner: &OwnerDetails,
    details: &CarDetails,
) -> Result<show_car::Model, AppError> {
    if car_number <= 0 {
        return Err(AppError::BadRequest(
            "Car number must be a positive number.".into(),
        ));
    }
    let txn = db.begin().await?;
    if find_by_number(&txn, show_id, car_number).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Car #{car_number} is already registered for this show."
        )));
    }

    let person = create_person(&txn, owner).await?;
    let mut car = new_car(show_id, Some(person.id), car_number);
    car.year = Set(details.year.clone());
    car.make = Set(details.make.clone());
    car.model = Set(details.model.clone());
    let car = car.insert(&txn).await?;
    txn.commit().await?;

    debug!("Registered car #{} for show {}", car.car_number, show_id);
    Ok(car)
}

/// Creates cars numbered `start_number..start_number + count`, skipping numbers
/// already taken. Returns how many were created.
pub async fn create_placeholder_cars<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    show_id: i32,
    start_number: i32,
    count: i32,
) -> Result<u32, AppError> {
    if start_number < 1 || !(1..=MAX_PLACEHOLDERS_PER_BATCH).contains(&count) {
        return Err(AppError::BadRequest(
            "Invalid placeholder range. Count must be 1–1000.".into(),
        ));
    }
    let end = start_number
        .checked_add(count)
        .ok_or_else(|| AppError::BadRequest("Placeholder range is too large.".into()))?;

    let taken: Vec<i32> = ShowCar::find()
        .filter(show_car::Column::ShowId.eq(show_id))
        .filter(show_car::Column::CarNumber.gte(start_number))
        .filter(show_car::Column::CarNumber.lt(end))
        .all(db)
        .await?
        .into_iter()
        .map(|car| car.car_number)
        .collect();

    let txn = db.begin().await?;
    let mut created = 0;
    for number in start_number..end {
        if taken.contains(&number) {
            continue;
        }
        new_car(show_id, None, number).insert(&txn).await?;
        created += 1;
    }
    txn.commit().await?;
    Ok(created)
}

/// Check-in: the car must already exist. Updates the owner, creating one if the
/// car is still a placeholder, then the car details.
pub async fn check_in<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    car: show_car::Model,
    owner: &OwnerDetails,
    details: &CarDetails,
) -> Result<CarWithOwner, DbErr> {
    let txn = db.begin().await?;

    let existing_owner = match car.person_id {
        Some(person_id) => Person::find_by_id(person_id).one(&txn).await?,
        None => None,
    };
    let person = match existing_owner {
        Some(existing) => update_person(&txn, existing, owner).await?,
        None => create_person(&txn, owner).await?,
    };

    let mut model = car.into_active_model();
    model.person_id = Set(Some(person.id));
    model.year = Set(details.year.clone());
    model.make = Set(details.make.clone());
    model.model = Set(details.model.clone());
    model.updated_at = Set(Utc::now());
    let car = model.update(&txn).await?;

    txn.commit().await?;
    Ok(CarWithOwner {
        car,
        owner: Some(person),
    })
}

/// Records receipt of the paper waiver. Returns false if the car is not in the show.
pub async fn mark_waiver_received<C: ConnectionTrait>(
    db: &C,
    show_id: i32,
    show_car_id: i32,
    received_by: &str,
) -> Result<bool, DbErr> {
    let car = ShowCar::find_by_id(show_car_id)
        .filter(show_car::Column::ShowId.eq(show_id))
        .one(db)
        .await?;
    let Some(car) = car else {
        return Ok(false);
    };

    let mut model = car.into_active_model();
    model.waiver_received = Set(true);
    model.waiver_received_at = Set(Some(Utc::now()));
    model.waiver_received_by = Set(Some(received_by.to_string()));
    model.updated_at = Set(Utc::now());
    model.update(db).await?;
    Ok(true)
}
