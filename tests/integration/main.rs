mod common;

mod admin;
mod attend;
mod reporting;
