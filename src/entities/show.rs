use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "show")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    pub date_text: String,
    pub time_text: String,
    pub location_name: String,
    pub address: String,
    pub benefiting: String,
    pub suggested_donation: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub is_active: bool,
    pub voting_open: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::show_car::Entity")]
    ShowCar,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
    #[sea_orm(has_many = "super::show_sponsor::Entity")]
    ShowSponsor,
    #[sea_orm(has_many = "super::attendee::Entity")]
    Attendee,
    #[sea_orm(has_many = "super::donation::Entity")]
    Donation,
}

impl Related<super::show_car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowCar.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::show_sponsor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowSponsor.def()
    }
}

impl Related<super::attendee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendee.def()
    }
}

impl Related<super::donation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
