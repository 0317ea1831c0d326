use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A car owner. Contact fields stay empty until check-in fills them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub opt_in_future: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::show_car::Entity")]
    ShowCar,
}

impl Related<super::show_car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowCar.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
