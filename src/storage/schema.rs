//! Database schema definitions
//!
//! Every statement is additive and guarded with `IF NOT EXISTS`, so the
//! upgrade step can be replayed against a database at any earlier version.

/// Version stamped into `PRAGMA user_version` after an upgrade
pub const SCHEMA_VERSION: i64 = 4;

/// Key of the single row in `active_profile`
pub const ACTIVE_PROFILE_KEY: &str = "current";

/// SQL to create the profiles table
pub const CREATE_PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    class TEXT NOT NULL,
    language TEXT NOT NULL
)
"#;

/// SQL to create the topics table
/// Ids are caller-supplied UUIDs; quiz holds the JSON-encoded question list
pub const CREATE_TOPICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS topics (
    id TEXT PRIMARY KEY,
    class TEXT NOT NULL,
    language TEXT NOT NULL,
    title TEXT NOT NULL,
    article TEXT,
    video TEXT,
    quiz TEXT
)
"#;

/// SQL to create the results table (append-only)
pub const CREATE_RESULTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id INTEGER NOT NULL,
    topic_id TEXT NOT NULL
)
"#;

/// SQL to create the single-slot active profile map
pub const CREATE_ACTIVE_PROFILE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS active_profile (
    key TEXT PRIMARY KEY,
    profile_id INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_topics_class ON topics(class)",
    "CREATE INDEX IF NOT EXISTS idx_results_profile ON results(profile_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_PROFILES_TABLE,
        CREATE_TOPICS_TABLE,
        CREATE_RESULTS_TABLE,
        CREATE_ACTIVE_PROFILE_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
