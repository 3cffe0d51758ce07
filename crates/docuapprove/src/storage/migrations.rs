//! Schema versioning for the document database.
//!
//! Base tables come from [`SCHEMA_STATEMENTS`] and are created idempotently.
//! Changes after that are listed in [`MIGRATIONS`] and applied in order, each
//! inside its own transaction together with the version bump.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// Version a freshly opened database ends up at.
pub const CURRENT_VERSION: u32 = 1;

const VERSION_KEY: &str = "schema_version";

/// One step in the schema history.
#[derive(Debug)]
struct Migration {
    version: u32,
    description: &'static str,
    statements: &'static [&'static str],
}

/// Ordered schema history. Version 1 is the base schema itself.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "documents and sessions",
    statements: &[],
}];

/// Create the base tables and bring the schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Fails if a statement fails, if the stored version is unreadable, or if the
/// database was written by a newer release.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored = stored_version(conn)?;
    if stored > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {stored} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > stored) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// The recorded version, `0` for a database that never recorded one.
fn stored_version(conn: &Connection) -> Result<u32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(v) => v.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {v}"),
        }),
    }
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::debug!(
        version = migration.version,
        description = migration.description,
        "Applying schema migration"
    );

    let tx = conn.unchecked_transaction()?;
    for statement in migration.statements {
        tx.execute_batch(statement)
            .map_err(|e| Error::DatabaseMigration {
                message: format!("migration {} failed: {e}", migration.version),
            })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, migration.version.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}
