pub use super::attendee::Entity as Attendee;
pub use super::donation::Entity as Donation;
pub use super::field_metric::Entity as FieldMetric;
pub use super::person::Entity as Person;
pub use super::show::Entity as Show;
pub use super::show_car::Entity as ShowCar;
pub use super::show_sponsor::Entity as ShowSponsor;
pub use super::sponsor::Entity as Sponsor;
pub use super::vote::Entity as Vote;
