use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Attendee Table
        let table = Table::create()
            .table(Attendee::Table)
            .if_not_exists()
            .col(pk_auto(Attendee::Id))
            .col(integer(Attendee::ShowId))
            .col(string(Attendee::FirstName))
            .col(string(Attendee::LastName))
            .col(string(Attendee::Phone).default(""))
            .col(string(Attendee::Email).default(""))
            .col(string(Attendee::ZipCode).default(""))
            .col(boolean(Attendee::SponsorOptIn).default(false))
            .col(boolean(Attendee::UpdatesOptIn).default(false))
            .col(text(Attendee::ConsentText))
            .col(string(Attendee::ConsentVersion))
            .col(timestamp_with_time_zone(Attendee::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_attendee_show")
                    .from(Attendee::Table, Attendee::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create Donation Table
        let table = Table::create()
            .table(Donation::Table)
            .if_not_exists()
            .col(pk_auto(Donation::Id))
            .col(integer(Donation::ShowId))
            .col(integer_null(Donation::AttendeeId))
            .col(integer(Donation::AmountCents))
            .col(string_len(Donation::Status, 16))
            .col(string_null(Donation::StripeSessionId).unique_key())
            .col(timestamp_with_time_zone_null(Donation::PaidAt))
            .col(timestamp_with_time_zone(Donation::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_donation_show")
                    .from(Donation::Table, Donation::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_donation_attendee")
                    .from(Donation::Table, Donation::AttendeeId)
                    .to(Attendee::Table, Attendee::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create FieldMetric Table
        let table = Table::create()
            .table(FieldMetric::Table)
            .if_not_exists()
            .col(pk_auto(FieldMetric::Id))
            .col(integer(FieldMetric::ShowId))
            .col(string(FieldMetric::FieldName))
            .col(boolean(FieldMetric::Provided))
            .col(timestamp_with_time_zone(FieldMetric::CreatedAt))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_field_metric_show")
                    .from(FieldMetric::Table, FieldMetric::ShowId)
                    .to(Show::Table, Show::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendee_show")
                    .table(Attendee::Table)
                    .col(Attendee::ShowId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FieldMetric::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Donation::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Attendee::Table).to_owned())
            .await?;

        Ok(())
    }
}
