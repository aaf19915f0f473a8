//! calendar_store Library
//!
//! Calendar event persistence, HTTP surface and the migration sequencer.

pub mod api;
pub mod calendar;
pub mod config;
pub mod db;
mod error;
pub mod migrate;

pub use calendar::{CalendarStore, StoreError};
pub use config::Config;
pub use db::{ConnectionError, ConnectionUrl};
pub use error::{AppError, AppResult};
pub use migrate::{MigrationError, Sequencer};
