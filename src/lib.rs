pub mod auth;
pub mod config;
pub mod database;
pub mod entities;
pub mod error;
pub mod export;
pub mod extract;
pub mod router;
pub mod routes;
pub mod store;
pub mod stripe;
pub mod util;
pub mod voting;
