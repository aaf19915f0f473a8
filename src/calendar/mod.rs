//! Calendar module
//!
//! Persistence layer for calendar events.
//! Every operation runs inside a guarded unit of work on a pooled connection.

mod error;
mod guard;
mod model;
pub mod queries;
mod repository;

pub use error::StoreError;
pub use guard::{guarded, suppress_database_error, ScopeGuard, UnitOfWork};
pub use model::{iso8601, BatchItem, BatchOutcome, CalendarEvent, EventChanges, EventView, NewEvent};
pub use repository::CalendarStore;
