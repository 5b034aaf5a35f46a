//! Completion tracking
//!
//! Completions live in two places:
//! - `results` rows, appended once per finished quiz attempt (authoritative)
//! - the completion mirror, a per-profile id list rewritten on every change
//!
//! Reads take the union of both, so a completion that survives in either
//! backend counts. Mirror failures are logged and never reach the caller.

use crate::mirror::{mirror_key, CompletionMirror};
use crate::storage::Database;
use crate::topic::Topic;
use crate::Result;
use rusqlite::params;
use std::collections::BTreeSet;

/// Completion progress over a set of topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Whole-number percentage, 0 when there is nothing to complete
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Records and reconciles quiz completions
pub struct CompletionTracker<'a> {
    db: &'a Database,
    mirror: &'a dyn CompletionMirror,
}

impl<'a> CompletionTracker<'a> {
    pub fn new(db: &'a Database, mirror: &'a dyn CompletionMirror) -> Self {
        Self { db, mirror }
    }

    /// Append a result row; repeated attempts add repeated rows
    pub fn record_completion(&self, profile_id: i64, topic_id: &str) -> Result<i64> {
        self.db.conn().execute(
            "INSERT INTO results (profile_id, topic_id) VALUES (?1, ?2)",
            params![profile_id, topic_id],
        )?;
        let id = self.db.conn().last_insert_rowid();
        tracing::debug!("Recorded result {} (profile {}, topic {})", id, profile_id, topic_id);
        Ok(id)
    }

    /// Distinct topic ids in `results` for a profile
    pub fn durable_completed_ids(&self, profile_id: i64) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT DISTINCT topic_id FROM results WHERE profile_id = ?1")?;
        let ids = stmt
            .query_map([profile_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(ids)
    }

    /// Topic ids held by the mirror for a profile; unreadable mirrors count as empty
    pub fn mirrored_completed_ids(&self, profile_id: i64) -> BTreeSet<String> {
        match self.mirror.load(&mirror_key(profile_id)) {
            Ok(ids) => ids.unwrap_or_default().into_iter().collect(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable completion mirror for profile {}: {}", profile_id, e);
                BTreeSet::new()
            }
        }
    }

    /// Union of durable results and the mirror
    pub fn load_completed_topic_ids(&self, profile_id: i64) -> Result<BTreeSet<String>> {
        let mut ids = self.durable_completed_ids(profile_id)?;
        ids.extend(self.mirrored_completed_ids(profile_id));
        Ok(ids)
    }

    /// Overwrite the mirror with `completed`; failures are only logged
    pub fn persist_mirror(&self, profile_id: i64, completed: &BTreeSet<String>) {
        let ids: Vec<String> = completed.iter().cloned().collect();
        if let Err(e) = self.mirror.store(&mirror_key(profile_id), &ids) {
            tracing::warn!("Failed to persist completion mirror for profile {}: {}", profile_id, e);
        }
    }

    /// Record a finished quiz and refresh the mirror.
    ///
    /// Returns the profile's completion set including `topic_id`.
    pub fn mark_complete(&self, profile_id: i64, topic_id: &str) -> Result<BTreeSet<String>> {
        self.record_completion(profile_id, topic_id)?;
        let mut completed = self.load_completed_topic_ids(profile_id)?;
        completed.insert(topic_id.to_string());
        self.persist_mirror(profile_id, &completed);
        Ok(completed)
    }

    /// How many of `topics` the profile has completed
    pub fn progress(&self, profile_id: i64, topics: &[Topic]) -> Result<Progress> {
        let completed_ids = self.load_completed_topic_ids(profile_id)?;
        let completed = topics
            .iter()
            .filter(|t| completed_ids.contains(&t.id))
            .count();
        Ok(Progress {
            completed,
            total: topics.len(),
        })
    }
}
