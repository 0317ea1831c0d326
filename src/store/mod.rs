//! Queries over the schema, one module per aggregate.
//!
//! Functions take the connection explicitly and never consult ambient state;
//! callers pass the show they are working on.

pub mod attendee;
pub mod car;
pub mod show;
pub mod sponsor;
pub mod vote;
