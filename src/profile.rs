//! Student profiles and the active-profile pointer
//!
//! Profiles are anonymous local records. Exactly one row in `active_profile`
//! names the profile currently in use; switching profiles only rewrites that
//! row, and profiles themselves are never deleted.

use crate::storage::schema::ACTIVE_PROFILE_KEY;
use crate::storage::Database;
use crate::{Error, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Content language of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    /// Get the string representation of the language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }

    /// Lowercased form used in content feed paths
    pub fn feed_segment(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            _ => Err(Error::InvalidLanguage(s.to_string())),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A profile as entered by the student, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub class: String,
    pub language: Language,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, class: impl Into<String>, language: Language) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            language,
        }
    }

    /// Trim name and class and reject empty values.
    ///
    /// This is the form-level check; `ProfileStore::save_profile` stores
    /// whatever it is given.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let class = self.class.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidProfile("name must not be empty".into()));
        }
        if class.is_empty() {
            return Err(Error::InvalidProfile("class must not be empty".into()));
        }
        Ok(Self {
            name,
            class,
            language: self.language,
        })
    }
}

/// A stored student profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub class: String,
    pub language: Language,
}

/// CRUD over profiles plus the active pointer
pub struct ProfileStore<'a> {
    db: &'a Database,
}

impl<'a> ProfileStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a profile and make it the active one.
    ///
    /// Both writes share one transaction; if either fails neither is kept.
    pub fn save_profile(&self, profile: NewProfile) -> Result<Profile> {
        let tx = self.db.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO profiles (name, class, language) VALUES (?1, ?2, ?3)",
            params![profile.name, profile.class, profile.language.as_str()],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT OR REPLACE INTO active_profile (key, profile_id) VALUES (?1, ?2)",
            params![ACTIVE_PROFILE_KEY, id],
        )?;
        tx.commit()?;

        tracing::info!("Saved profile {} ({}) as active", id, profile.name);
        Ok(Profile {
            id,
            name: profile.name,
            class: profile.class,
            language: profile.language,
        })
    }

    /// The profile named by the active pointer.
    ///
    /// Returns `None` when no pointer is set or it names a missing profile.
    pub fn get_profile(&self) -> Result<Option<Profile>> {
        let Some(id) = self.active_profile_id()? else {
            return Ok(None);
        };
        let profile = self.get_profile_by_id(id)?;
        if profile.is_none() {
            tracing::debug!("Active profile pointer {} is dangling", id);
        }
        Ok(profile)
    }

    /// Raw value of the active pointer, if set
    pub fn active_profile_id(&self) -> Result<Option<i64>> {
        self.db
            .conn()
            .query_row(
                "SELECT profile_id FROM active_profile WHERE key = ?1",
                [ACTIVE_PROFILE_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a profile by id
    pub fn get_profile_by_id(&self, id: i64) -> Result<Option<Profile>> {
        self.db
            .conn()
            .query_row(
                "SELECT id, name, class, language FROM profiles WHERE id = ?1",
                [id],
                row_to_profile,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Every stored profile
    pub fn get_all_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT id, name, class, language FROM profiles ORDER BY id")?;
        let profiles = stmt
            .query_map([], row_to_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    /// Point the active pointer at `id` without checking that it exists
    pub fn set_active_profile(&self, id: i64) -> Result<()> {
        self.db.conn().execute(
            "INSERT OR REPLACE INTO active_profile (key, profile_id) VALUES (?1, ?2)",
            params![ACTIVE_PROFILE_KEY, id],
        )?;
        tracing::info!("Active profile set to {}", id);
        Ok(())
    }
}

fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    let language_str: String = row.get(3)?;
    let language: Language = language_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        class: row.get(2)?,
        language,
    })
}
