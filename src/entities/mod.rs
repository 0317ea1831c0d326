pub mod prelude;

pub mod attendee;
pub mod donation;
pub mod field_metric;
pub mod person;
pub mod show;
pub mod show_car;
pub mod show_sponsor;
pub mod sponsor;
pub mod vote;
