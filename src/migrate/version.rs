//! Migration versions
//!
//! `migration_20161218_1_1.sql` carries the version fields `["20161218", "1", "1"]`:
//! the name up to the first `.sql`, split on `_`, leading token dropped.
//!
//! Fields compare as raw text, not numbers. Zero-pad numeric fields
//! (`02`, not `2`) or `10` sorts before `9`.

use std::cmp::Ordering;

use super::MigrationError;

/// File names that take part in a migration run start with this
pub const MIGRATION_PREFIX: &str = "migration";

const SCRIPT_EXTENSION: &str = ".sql";

/// A discovered migration script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    filename: String,
    version_fields: Vec<String>,
}

impl MigrationScript {
    /// Parse a migration file name into its version fields
    pub fn parse(filename: impl Into<String>) -> Result<Self, MigrationError> {
        let filename = filename.into();

        let stem = match filename.find(SCRIPT_EXTENSION) {
            Some(end) => &filename[..end],
            None => return Err(MigrationError::InvalidFilename(filename)),
        };

        let version_fields = stem.split('_').skip(1).map(str::to_string).collect();

        Ok(Self {
            filename,
            version_fields,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn version_fields(&self) -> &[String] {
        &self.version_fields
    }
}

impl Ord for MigrationScript {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_version_fields(&self.version_fields, &other.version_fields)
            .then_with(|| self.filename.cmp(&other.filename))
    }
}

impl PartialOrd for MigrationScript {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two version field lists.
///
/// The first differing field decides. When one list is a prefix of the other,
/// the shorter list sorts first.
pub fn compare_version_fields<S: AsRef<str>>(left: &[S], right: &[S]) -> Ordering {
    for (l, r) in left.iter().zip(right) {
        match l.as_ref().cmp(r.as_ref()) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }

    left.len().cmp(&right.len())
}

/// Order two migration file names. Identical version fields fall back to the full name.
pub fn compare_filenames(left: &str, right: &str) -> Result<Ordering, MigrationError> {
    let left = MigrationScript::parse(left)?;
    let right = MigrationScript::parse(right)?;
    Ok(left.cmp(&right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        compare_filenames(a, b).unwrap()
    }

    #[test]
    fn test_version_fields_extracted() {
        let script = MigrationScript::parse("migration_20161218_1_1.sql").unwrap();
        assert_eq!(script.version_fields(), ["20161218", "1", "1"]);
        assert_eq!(script.filename(), "migration_20161218_1_1.sql");
    }

    #[test]
    fn test_stem_ends_at_first_sql() {
        let script = MigrationScript::parse("migration_20161218_1.sql.bak").unwrap();
        assert_eq!(script.version_fields(), ["20161218", "1"]);
    }

    #[test]
    fn test_missing_extension_rejected() {
        let err = MigrationScript::parse("migration_notes.txt").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFilename(name) if name == "migration_notes.txt"));
    }

    #[test]
    fn test_sequence_field_orders() {
        assert_eq!(cmp("migration_20161218_1.sql", "migration_20161218_2.sql"), Ordering::Less);
        assert_eq!(cmp("migration_20161218_2.sql", "migration_20161218_1.sql"), Ordering::Greater);
    }

    #[test]
    fn test_date_field_orders() {
        assert_eq!(cmp("migration_20161219_1.sql", "migration_20161218_1.sql"), Ordering::Greater);
        assert_eq!(cmp("migration_20161218_9.sql", "migration_20161219_1.sql"), Ordering::Less);
    }

    #[test]
    fn test_shorter_prefix_sorts_first() {
        assert_eq!(cmp("migration_20161218_1.sql", "migration_20161218_1_1.sql"), Ordering::Less);
        assert_eq!(cmp("migration_20161218_1_1.sql", "migration_20161218_1.sql"), Ordering::Greater);
        // A difference inside the shared prefix still wins over length
        assert_eq!(cmp("migration_20161218_2.sql", "migration_20161218_1_1.sql"), Ordering::Greater);
    }

    #[test]
    fn test_fields_compare_as_text() {
        assert_eq!(cmp("migration_20161218_10.sql", "migration_20161218_9.sql"), Ordering::Less);
        assert_eq!(cmp("migration_20161218_10.sql", "migration_20161218_09.sql"), Ordering::Greater);
    }

    #[test]
    fn test_identical_fields_tie_break_on_name() {
        assert_eq!(cmp("migration_20161218_1.sql", "migration_20161218_1.sql"), Ordering::Equal);
        assert_eq!(cmp("Migration_20161218_1.sql", "migration_20161218_1.sql"), Ordering::Less);
        assert_eq!(cmp("migration_20161218_1.sql", "migration_20161218_1.sql.orig"), Ordering::Less);
    }

    #[test]
    fn test_antisymmetric_and_transitive() {
        let names = [
            "migration_20161218_1.sql",
            "migration_20161218_1_1.sql",
            "migration_20161218_1_2.sql",
            "migration_20161218_2.sql",
            "migration_20161219_01.sql",
            "migration_20161219_1.sql",
            "migration_20170101_1_1_1.sql",
            "migration_20161218.sql",
        ];

        for a in names {
            for b in names {
                assert_eq!(cmp(a, b), cmp(b, a).reverse(), "antisymmetry {a} {b}");
                for c in names {
                    if cmp(a, b) != Ordering::Greater && cmp(b, c) != Ordering::Greater {
                        assert_ne!(cmp(a, c), Ordering::Greater, "transitivity {a} {b} {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_sorting_scripts() {
        let mut scripts: Vec<MigrationScript> = [
            "migration_20161219_1.sql",
            "migration_20161218_2.sql",
            "migration_20161218_1_1.sql",
            "migration_20161218_1.sql",
        ]
        .into_iter()
        .map(|name| MigrationScript::parse(name).unwrap())
        .collect();

        scripts.sort();

        let order: Vec<&str> = scripts.iter().map(MigrationScript::filename).collect();
        assert_eq!(
            order,
            [
                "migration_20161218_1.sql",
                "migration_20161218_1_1.sql",
                "migration_20161218_2.sql",
                "migration_20161219_1.sql",
            ]
        );
    }
}
