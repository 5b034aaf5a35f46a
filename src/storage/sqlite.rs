//! SQLite storage implementation

use std::path::Path;
use rusqlite::Connection;
use crate::{Result, Error};
use super::schema;

/// Handle to the local learning database.
///
/// Owns the single connection shared by the profile store, topic cache and
/// completion tracker. Each of those borrows the database and scopes its own
/// transactions to the tables it touches.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database file (creates if doesn't exist) and upgrade its schema
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.upgrade()?;
        tracing::debug!("Opened database {} at schema v{}", path.display(), schema::SCHEMA_VERSION);
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.upgrade()?;
        Ok(db)
    }

    /// Bring the schema up to `SCHEMA_VERSION`.
    ///
    /// Safe to run repeatedly: existing tables and indexes are left alone.
    /// A database stamped with a newer version is refused rather than touched.
    pub fn upgrade(&self) -> Result<()> {
        let found = self.schema_version()?;
        if found > schema::SCHEMA_VERSION {
            return Err(Error::SchemaVersion {
                found,
                supported: schema::SCHEMA_VERSION,
            });
        }

        let tx = self.conn.unchecked_transaction()?;
        for stmt in schema::all_schema_statements() {
            tx.execute(stmt, [])?;
        }
        if found < schema::SCHEMA_VERSION {
            tx.pragma_update(None, "user_version", schema::SCHEMA_VERSION)?;
            tracing::info!("Upgraded database schema v{} -> v{}", found, schema::SCHEMA_VERSION);
        }
        tx.commit()?;
        Ok(())
    }

    /// Current `user_version` stamped on the database
    pub fn schema_version(&self) -> Result<i64> {
        let version: i64 = self.conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            schema_version: self.schema_version()?,
            profiles: self.count("profiles")?,
            topics: self.count("topics")?,
            results: self.count("results")?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub schema_version: i64,
    pub profiles: usize,
    pub topics: usize,
    pub results: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Schema version: {}", self.schema_version)?;
        writeln!(f, "  Profiles: {}", self.profiles)?;
        writeln!(f, "  Topics: {}", self.topics)?;
        writeln!(f, "  Results: {}", self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        let mut stmt = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_open_creates_four_collections() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            table_names(&db),
            vec!["active_profile", "profiles", "results", "topics"]
        );
        assert_eq!(db.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_class_index_exists() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_topics_class'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute("INSERT INTO profiles (name, class, language) VALUES ('Asha', '8', 'English')", [])
            .unwrap();

        db.upgrade().unwrap();
        db.upgrade().unwrap();

        assert_eq!(db.stats().unwrap().profiles, 1);
        assert_eq!(db.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_upgrade_from_older_version_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edubattle.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute(schema::CREATE_PROFILES_TABLE, []).unwrap();
            conn.execute("INSERT INTO profiles (name, class, language) VALUES ('Ravi', '6', 'Hindi')", [])
                .unwrap();
            conn.pragma_update(None, "user_version", 2).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.profiles, 1);
        assert_eq!(stats.topics, 0);
        assert_eq!(stats.schema_version, schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edubattle.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.pragma_update(None, "user_version", schema::SCHEMA_VERSION + 1).unwrap();
        }

        match Database::open(&path) {
            Err(Error::SchemaVersion { found, supported }) => {
                assert_eq!(found, schema::SCHEMA_VERSION + 1);
                assert_eq!(supported, schema::SCHEMA_VERSION);
            }
            other => panic!("expected schema version error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_fails_for_unreachable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nested").join("edubattle.db");
        assert!(matches!(Database::open(&path), Err(Error::Storage(_))));
    }
}
