//! Migration module
//!
//! Discovers `migration_*.sql` scripts, orders them by their version fields
//! and applies them one at a time, recording each in a ledger table.

mod error;
mod sequencer;
mod version;

pub use error::{
    MigrationError, EXIT_CONNECTION_FAILED, EXIT_DISCOVERY_FAILED, EXIT_SCRIPT_FAILED,
};
pub use sequencer::{discover, plan, MigrationReport, Progress, Sequencer};
pub use version::{compare_filenames, compare_version_fields, MigrationScript, MIGRATION_PREFIX};
