use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sponsor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub logo_path: String,
    pub website_url: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::show_sponsor::Entity")]
    ShowSponsor,
}

impl Related<super::show_sponsor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShowSponsor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
