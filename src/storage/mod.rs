//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - profiles(id, name, class, language)
//! - topics(id, class, language, title, article, video, quiz)
//! - results(id, profile_id, topic_id)
//! - active_profile(key, profile_id)

pub mod schema;
pub mod sqlite;

pub use sqlite::{Database, DbStats};
