use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum Show {
    Table,
    Id,
    Slug,
    Title,
    DateText,
    TimeText,
    LocationName,
    Address,
    Benefiting,
    SuggestedDonation,
    Description,
    IsActive,
    VotingOpen,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Person {
    Table,
    Id,
    Name,
    Phone,
    Email,
    OptInFuture,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ShowCar {
    Table,
    Id,
    ShowId,
    PersonId,
    CarNumber,
    CarToken,
    Year,
    Make,
    Model,
    WaiverReceived,
    WaiverReceivedAt,
    WaiverReceivedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Vote {
    Table,
    Id,
    ShowId,
    ShowCarId,
    Category,
    VoteQty,
    AmountCents,
    StripeSessionId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Sponsor {
    Table,
    Id,
    Name,
    LogoPath,
    WebsiteUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ShowSponsor {
    Table,
    Id,
    ShowId,
    SponsorId,
    Placement,
    SortOrder,
}

#[derive(DeriveIden)]
pub enum Attendee {
    Table,
    Id,
    ShowId,
    FirstName,
    LastName,
    Phone,
    Email,
    ZipCode,
    SponsorOptIn,
    UpdatesOptIn,
    ConsentText,
    ConsentVersion,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Donation {
    Table,
    Id,
    ShowId,
    AttendeeId,
    AmountCents,
    Status,
    StripeSessionId,
    PaidAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum FieldMetric {
    Table,
    Id,
    ShowId,
    FieldName,
    Provided,
    CreatedAt,
}
