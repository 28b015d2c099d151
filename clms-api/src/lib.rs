pub mod config;
pub mod database;
pub mod handlers;
pub mod helpers;
pub mod ingestion;
pub mod jobs;
pub mod notify;

pub use database::Database;
