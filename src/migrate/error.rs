//! Migration Errors

use std::path::PathBuf;

/// A script failed to read or apply
pub const EXIT_SCRIPT_FAILED: u8 = 1;
/// The directory could not be listed or held an unusable file name
pub const EXIT_DISCOVERY_FAILED: u8 = 2;
/// Configuration, connection or ledger failure
pub const EXIT_CONNECTION_FAILED: u8 = 3;

/// Errors that stop a migration run
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Migration directory could not be listed
    #[error("Failed to read migration directory {path}: {source}")]
    Discover {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File name starts with the migration prefix but has no `.sql` part or is not UTF-8
    #[error("Invalid migration filename: {0}")]
    InvalidFilename(String),

    /// Script content could not be read
    #[error("Failed to read migration script {filename}: {source}")]
    Read {
        filename: String,
        source: std::io::Error,
    },

    /// Script rejected by the database
    #[error("Migration {filename} failed: {source}")]
    Apply {
        filename: String,
        source: sqlx::Error,
    },

    /// Ledger table could not be created or read
    #[error("Migration ledger error: {0}")]
    Ledger(#[from] sqlx::Error),
}

impl MigrationError {
    /// Name of the script that failed, if a specific script is to blame
    pub fn failing_filename(&self) -> Option<&str> {
        match self {
            MigrationError::InvalidFilename(filename)
            | MigrationError::Read { filename, .. }
            | MigrationError::Apply { filename, .. } => Some(filename),
            MigrationError::Discover { .. } | MigrationError::Ledger(_) => None,
        }
    }

    /// Check if this error happened before any script was applied
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            MigrationError::Discover { .. } | MigrationError::InvalidFilename(_)
        )
    }

    /// Process exit code reported by the `migrate` binary
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrationError::Discover { .. } | MigrationError::InvalidFilename(_) => {
                EXIT_DISCOVERY_FAILED
            }
            MigrationError::Read { .. } | MigrationError::Apply { .. } => EXIT_SCRIPT_FAILED,
            MigrationError::Ledger(_) => EXIT_CONNECTION_FAILED,
        }
    }
}
