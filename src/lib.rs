//! # EduBattle - Offline-first learning store
//!
//! Local persistence core for a classroom quiz application.
//!
//! EduBattle provides:
//! - SQLite-backed storage with an additive, versioned schema
//! - Anonymous student profiles with a durable active-profile pointer
//! - Per-class topic content hydrated lazily from a static JSON feed
//! - Quiz completion tracking reconciled across the database and a key-value mirror
//! - Pure quiz scoring and a seedable simulated leaderboard

pub mod storage;
pub mod profile;
pub mod topic;
pub mod feed;
pub mod mirror;
pub mod completion;
pub mod quiz;
pub mod leaderboard;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use storage::Database;
pub use profile::{Language, NewProfile, Profile, ProfileStore};
pub use topic::{Hydration, QuizQuestion, Topic, TopicCache};
pub use feed::{ContentFeed, HttpContentFeed};
pub use mirror::{CompletionMirror, FileMirror, MemoryMirror};
pub use completion::{CompletionTracker, Progress};

/// Result type alias for EduBattle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for EduBattle operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i64, supported: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Content feed returned {status} for {url}")]
    FeedStatus { status: u16, url: String },

    #[error("Content feed error: {0}")]
    Feed(String),

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Mirror error: {0}")]
    Mirror(String),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),
}
