use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Sponsor::Table)
            .if_not_exists()
            .col(pk_auto(Sponsor::Id))
            .col(string_uniq(Sponsor::Name))
            .col(string(Sponsor::LogoPath).default(""))
            .col(string(Sponsor::WebsiteUrl).default(""))
            .col(timestamp_with_time_zone(Sponsor::CreatedAt))
            .to_owned();
        manager.create_table(table).await?;

        let table = Table::create()
            .table(ShowSponsor::Table)
            .if_not_exists()
            .col(pk_auto(ShowSponsor::Id))
            .col(integer(ShowSponsor::ShowId))
            .col(integer(ShowSponsor::SponsorId))
            .col(string_len(ShowSponsor::Placement, 16).default("standard"))
            .col(integer(ShowSponsor::SortOrder).default(100))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_show_sponsor_show")
                    .from(ShowSponsor::Table, ShowSponsor::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_show_sponsor_sponsor")
                    .from(ShowSponsor::Table, ShowSponsor::SponsorId)
                    .to(Sponsor::Table, Sponsor::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_show_sponsor_unique")
                    .table(ShowSponsor::Table)
                    .col(ShowSponsor::ShowId)
                    .col(ShowSponsor::SponsorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShowSponsor::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Sponsor::Table).to_owned())
            .await?;

        Ok(())
    }
}
