use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A paid vote. Rows are written once per checkout session and never updated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub show_id: i32,
    pub show_car_id: i32,
    pub category: String,
    pub vote_qty: i32,
    pub amount_cents: i32,
    #[sea_orm(unique)]
    pub stripe_session_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::show::Entity",
        from = "Column::ShowId",
        to = "super::show::Column::Id",
        on_delete = "Cascade"
    )]
    Show,
    #[sea_orm(
        belongs_to = "super::show_car::Entity",
        from = "Column::ShowCarId",
        to = "super::show_car::Column::Id",
        on_delete = "Cascade"
    )]
    ShowCar,
}

impl Related<super::show::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Show.def()
    }
}

impl Related<super::show_car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowCar.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
