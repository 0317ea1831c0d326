use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Show Table
        let table = Table::create()
            .table(Show::Table)
            .if_not_exists()
            .col(pk_auto(Show::Id))
            .col(string_uniq(Show::Slug))
            .col(string(Show::Title))
            .col(string(Show::DateText).default(""))
            .col(string(Show::TimeText).default(""))
            .col(string(Show::LocationName).default(""))
            .col(string(Show::Address).default(""))
            .col(string(Show::Benefiting).default(""))
            .col(string(Show::SuggestedDonation).default(""))
            .col(text(Show::Description).default(""))
            .col(boolean(Show::IsActive).default(false))
            .col(boolean(Show::VotingOpen).default(true))
            .col(timestamp_with_time_zone(Show::CreatedAt))
            .to_owned();
        manager.create_table(table).await?;

        // Create Person Table
        let table = Table::create()
            .table(Person::Table)
            .if_not_exists()
            .col(pk_auto(Person::Id))
            .col(string(Person::Name).default(""))
            .col(string(Person::Phone).default(""))
            .col(string(Person::Email).default(""))
            .col(boolean(Person::OptInFuture).default(false))
            .col(timestamp_with_time_zone(Person::CreatedAt))
            .col(timestamp_with_time_zone(Person::UpdatedAt))
            .to_owned();
        manager.create_table(table).await?;

        // Create ShowCar Table
        let table = Table::create()
            .table(ShowCar::Table)
            .if_not_exists()
            .col(pk_auto(ShowCar::Id))
            .col(integer(ShowCar::ShowId))
            .col(integer_null(ShowCar::PersonId))
            .col(integer(ShowCar::CarNumber))
            .col(string_uniq(ShowCar::CarToken))
            .col(string(ShowCar::Year).default(""))
            .col(string(ShowCar::Make).default(""))
            .col(string(ShowCar::Model).default(""))
            .col(boolean(ShowCar::WaiverReceived).default(false))
            .col(timestamp_with_time_zone_null(ShowCar::WaiverReceivedAt))
            .col(string_null(ShowCar::WaiverReceivedBy))
            .col(timestamp_with_time_zone(ShowCar::CreatedAt))
            .col(timestamp_with_time_zone(ShowCar::UpdatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_show_car_show")
                    .from(ShowCar::Table, ShowCar::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_show_car_person")
                    .from(ShowCar::Table, ShowCar::PersonId)
                    .to(Person::Table, Person::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create Vote Table
        //
        // The unique session id is what makes payment confirmation idempotent.
        let table = Table::create()
            .table(Vote::Table)
            .if_not_exists()
            .col(pk_auto(Vote::Id))
            .col(integer(Vote::ShowId))
            .col(integer(Vote::ShowCarId))
            .col(string(Vote::Category))
            .col(integer(Vote::VoteQty))
            .col(integer(Vote::AmountCents))
            .col(string_uniq(Vote::StripeSessionId))
            .col(timestamp_with_time_zone(Vote::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_vote_show")
                    .from(Vote::Table, Vote::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_vote_show_car")
                    .from(Vote::Table, Vote::ShowCarId)
                    .to(ShowCar::Table, ShowCar::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .check(Expr::col(Vote::VoteQty).gt(0))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_show_car_number")
                    .table(ShowCar::Table)
                    .col(ShowCar::ShowId)
                    .col(ShowCar::CarNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_show_car")
                    .table(Vote::Table)
                    .col(Vote::ShowId)
                    .col(Vote::ShowCarId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShowCar::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Person::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Show::Table).to_owned())
            .await?;

        Ok(())
    }
}
