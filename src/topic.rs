//! Topic cache - per-class content hydrated lazily from the content feed
//!
//! A class is hydrated once: the first call for a class with no stored topics
//! fetches the feed document and stores every valid record under a fresh
//! UUID. Later calls see at least one topic for the class and skip the feed.
//!
//! The gate keys on class only. A class hydrated in one language is never
//! hydrated again in another, and a class left partially written by a failed
//! ingestion is treated as complete.

use crate::feed::ContentFeed;
use crate::profile::Language;
use crate::storage::Database;
use crate::Result;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// One multiple-choice quiz question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "answerIndex")]
    pub answer_index: usize,
}

/// A stored topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub class: String,
    pub language: String,
    pub title: String,
    pub article: Option<String>,
    pub video: Option<String>,
    pub quiz: Option<Vec<QuizQuestion>>,
}

impl Topic {
    pub fn has_article(&self) -> bool {
        self.article.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn has_video(&self) -> bool {
        self.video.as_deref().is_some_and(|v| !v.is_empty())
    }

    pub fn has_quiz(&self) -> bool {
        self.quiz.as_ref().is_some_and(|q| !q.is_empty())
    }

    /// Number of quiz questions (0 without a quiz)
    pub fn quiz_len(&self) -> usize {
        self.quiz.as_ref().map_or(0, Vec::len)
    }
}

/// A topic record as published by the content feed.
///
/// Only `topic` and `language` decide whether a record is kept. Every field
/// decodes leniently: a value of the wrong shape reads as absent, and quiz
/// questions that do not decode are left out of the quiz.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTopic {
    #[serde(default, deserialize_with = "lenient")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub article: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub video: Option<String>,
    #[serde(default, deserialize_with = "lenient_quiz")]
    pub quiz: Option<Vec<QuizQuestion>>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_quiz<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<QuizQuestion>>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let questions: Vec<QuizQuestion> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    Ok((!questions.is_empty()).then_some(questions))
}

impl RawTopic {
    /// Convert into a storable topic for `class`.
    ///
    /// Returns `None` when the topic name or language is missing or empty.
    pub fn into_topic(self, class: &str) -> Option<Topic> {
        let title = self.topic.filter(|t| !t.is_empty())?;
        let language = self.language.filter(|l| !l.is_empty())?;
        Some(Topic {
            id: uuid::Uuid::new_v4().to_string(),
            class: class.to_string(),
            language,
            title,
            article: self.article,
            video: self.video,
            quiz: self.quiz,
        })
    }
}

/// Outcome of a hydration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// The class already had topics; the feed was not contacted
    AlreadyPresent,
    /// The feed was fetched and its valid records stored
    Fetched { stored: usize, skipped: usize },
}

/// Topic storage and lazy hydration
pub struct TopicCache<'a> {
    db: &'a Database,
    feed: &'a dyn ContentFeed,
}

impl<'a> TopicCache<'a> {
    pub fn new(db: &'a Database, feed: &'a dyn ContentFeed) -> Self {
        Self { db, feed }
    }

    /// Hydrate `class` from the feed unless it already has topics.
    ///
    /// Fetch failures abort before anything is written. Records are inserted
    /// one at a time, so a storage failure part way through keeps the records
    /// written before it.
    pub async fn store_class_data_if_needed(&self, class: &str, language: Language) -> Result<Hydration> {
        let already_stored = match self.class_has_topics(class) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Error checking stored topics for class-{}: {}", class, e);
                false
            }
        };

        if already_stored {
            tracing::info!("Class-{} data already present", class);
            return Ok(Hydration::AlreadyPresent);
        }

        let records = self.feed.fetch_class(class, language).await?;
        let outcome = self.ingest(class, records)?;
        if let Hydration::Fetched { stored, skipped } = outcome {
            tracing::info!("Stored class-{} data: {} topics ({} skipped)", class, stored, skipped);
        }
        Ok(outcome)
    }

    /// Validate and store raw feed records for `class`
    pub fn ingest(&self, class: &str, records: Vec<serde_json::Value>) -> Result<Hydration> {
        let mut stored = 0;
        let mut skipped = 0;

        for record in records {
            if !record.is_object() {
                tracing::warn!("Skipping non-object topic record in class-{}", class);
                skipped += 1;
                continue;
            }
            let topic = match serde_json::from_value::<RawTopic>(record) {
                Ok(raw) => raw.into_topic(class),
                Err(e) => {
                    tracing::warn!("Skipping unreadable topic in class-{}: {}", class, e);
                    skipped += 1;
                    continue;
                }
            };

            match topic {
                Some(topic) => {
                    self.insert_topic(&topic)?;
                    stored += 1;
                }
                None => {
                    tracing::warn!("Skipping topic without name or language in class-{}", class);
                    skipped += 1;
                }
            }
        }

        Ok(Hydration::Fetched { stored, skipped })
    }

    fn insert_topic(&self, topic: &Topic) -> Result<()> {
        let quiz = topic.quiz.as_ref().map(serde_json::to_string).transpose()?;
        self.db.conn().execute(
            r#"
            INSERT INTO topics (id, class, language, title, article, video, quiz)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                topic.id,
                topic.class,
                topic.language,
                topic.title,
                topic.article,
                topic.video,
                quiz,
            ],
        )?;
        Ok(())
    }

    /// Whether any topic is stored for `class`
    pub fn class_has_topics(&self, class: &str) -> Result<bool> {
        let found: bool = self.db.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM topics WHERE class = ?1)",
            [class],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// All stored topics
    pub fn get_all_topics(&self) -> Result<Vec<Topic>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, class, language, title, article, video, quiz FROM topics ORDER BY rowid",
        )?;
        let topics = stmt
            .query_map([], row_to_topic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(topics)
    }

    /// Topics of one class, in feed order
    pub fn topics_for_class(&self, class: &str) -> Result<Vec<Topic>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, class, language, title, article, video, quiz FROM topics WHERE class = ?1 ORDER BY rowid",
        )?;
        let topics = stmt
            .query_map([class], row_to_topic)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(topics)
    }

    /// Get a topic by id
    pub fn get_topic(&self, id: &str) -> Result<Option<Topic>> {
        self.db
            .conn()
            .query_row(
                "SELECT id, class, language, title, article, video, quiz FROM topics WHERE id = ?1",
                [id],
                row_to_topic,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Topics of `class` whose title contains `query`, ignoring case.
    ///
    /// A failed lookup is logged and yields no results.
    pub fn search_content(&self, query: &str, class: &str) -> Vec<Topic> {
        let needle = query.to_lowercase();
        match self.topics_for_class(class) {
            Ok(topics) => topics
                .into_iter()
                .filter(|t| t.title.to_lowercase().contains(&needle))
                .collect(),
            Err(e) => {
                tracing::error!("Search error in class-{}: {}", class, e);
                Vec::new()
            }
        }
    }
}

fn row_to_topic(row: &rusqlite::Row) -> rusqlite::Result<Topic> {
    let quiz_json: Option<String> = row.get(6)?;
    let quiz = quiz_json
        .map(|json| serde_json::from_str::<Vec<QuizQuestion>>(&json))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Topic {
        id: row.get(0)?,
        class: row.get(1)?,
        language: row.get(2)?,
        title: row.get(3)?,
        article: row.get(4)?,
        video: row.get(5)?,
        quiz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Feed serving a fixed document and counting fetches
    struct StubFeed {
        records: Option<Vec<serde_json::Value>>,
        fetches: AtomicUsize,
    }

    impl StubFeed {
        fn serving(records: serde_json::Value) -> Self {
            let records = match records {
                serde_json::Value::Array(items) => items,
                _ => panic!("stub feed needs an array"),
            };
            Self {
                records: Some(records),
                fetches: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                records: None,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentFeed for StubFeed {
        async fn fetch_class(&self, class: &str, language: Language) -> Result<Vec<serde_json::Value>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &self.records {
                Some(records) => Ok(records.clone()),
                None => Err(Error::FeedStatus {
                    status: 500,
                    url: format!("stub/{}/class-{}.json", language.feed_segment(), class),
                }),
            }
        }
    }

    fn class_eight() -> serde_json::Value {
        json!([
            {
                "topic": "Algebra Basics",
                "language": "English",
                "article": "Variables stand for numbers.",
                "quiz": [
                    {"question": "2x = 4, x = ?", "options": ["1", "2", "4"], "answerIndex": 1}
                ]
            },
            {"topic": "Linear Algebra Preview", "language": "English", "video": "https://example.com/v/1"},
            {"topic": "Fractions", "language": "English"}
        ])
    }

    #[tokio::test]
    async fn test_hydrates_once() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);

        let first = cache.store_class_data_if_needed("8", Language::English).await.unwrap();
        assert_eq!(first, Hydration::Fetched { stored: 3, skipped: 0 });
        let count = cache.get_all_topics().unwrap().len();

        let second = cache.store_class_data_if_needed("8", Language::English).await.unwrap();
        assert_eq!(second, Hydration::AlreadyPresent);
        assert_eq!(feed.fetches(), 1);
        assert_eq!(cache.get_all_topics().unwrap().len(), count);
    }

    #[tokio::test]
    async fn test_gate_ignores_language() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);

        cache.store_class_data_if_needed("8", Language::English).await.unwrap();
        let outcome = cache.store_class_data_if_needed("8", Language::Hindi).await.unwrap();

        assert_eq!(outcome, Hydration::AlreadyPresent);
        assert_eq!(feed.fetches(), 1);
    }

    #[tokio::test]
    async fn test_invalid_records_are_dropped() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::serving(json!([
            {"language": "English", "article": "no name"},
            {"topic": "", "language": "English"},
            {"topic": "No language"},
            {"topic": 42, "language": "English"},
            "Not a record",
            {"topic": "Photosynthesis", "language": "English"},
            {"topic": "Respiration", "language": "English"}
        ]));
        let cache = TopicCache::new(&db, &feed);

        let outcome = cache.store_class_data_if_needed("7", Language::English).await.unwrap();
        assert_eq!(outcome, Hydration::Fetched { stored: 2, skipped: 5 });

        let topics = cache.get_all_topics().unwrap();
        assert_eq!(topics.len(), 2);
        let ids: HashSet<_> = topics.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        for topic in &topics {
            assert_eq!(topic.class, "7");
            assert!(uuid::Uuid::parse_str(&topic.id).is_ok());
        }
    }

    #[test]
    fn test_odd_optional_fields_do_not_drop_records() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::failing();
        let cache = TopicCache::new(&db, &feed);

        let outcome = cache
            .ingest(
                "8",
                vec![
                    json!({"topic": "Algebra", "language": "English",
                           "quiz": [{"question": "q", "options": ["a", "b"]}]}),
                    json!({"topic": "Geometry", "language": "English", "video": 42}),
                    json!({"topic": "Bad quiz", "language": "English", "quiz": "not a list"}),
                    json!({"topic": "Mixed quiz", "language": "English", "article": ["x"],
                           "quiz": [
                               {"question": "kept", "options": ["a", "b"], "answerIndex": 0},
                               {"question": "dropped"}
                           ]}),
                ],
            )
            .unwrap();
        assert_eq!(outcome, Hydration::Fetched { stored: 4, skipped: 0 });

        let topics = cache.topics_for_class("8").unwrap();
        let by_title = |title: &str| topics.iter().find(|t| t.title == title).unwrap().clone();

        assert!(by_title("Algebra").quiz.is_none());
        assert!(by_title("Geometry").video.is_none());
        assert!(by_title("Bad quiz").quiz.is_none());

        let mixed = by_title("Mixed quiz");
        assert!(mixed.article.is_none());
        assert_eq!(mixed.quiz_len(), 1);
        assert_eq!(mixed.quiz.unwrap()[0].question, "kept");
    }

    #[tokio::test]
    async fn test_partial_hydration_keeps_written_rows() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                r#"
                CREATE TRIGGER fail_on_fractions BEFORE INSERT ON topics
                WHEN NEW.title = 'Fractions'
                BEGIN
                    SELECT RAISE(ABORT, 'disk full');
                END;
                "#,
            )
            .unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);

        let result = cache.store_class_data_if_needed("8", Language::English).await;
        assert!(matches!(result, Err(Error::Storage(_))));

        let titles: Vec<_> = cache
            .topics_for_class("8")
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Algebra Basics".to_string()));
        assert!(titles.contains(&"Linear Algebra Preview".to_string()));

        let again = cache.store_class_data_if_needed("8", Language::English).await.unwrap();
        assert_eq!(again, Hydration::AlreadyPresent);
        assert_eq!(feed.fetches(), 1);
    }

    #[tokio::test]
    async fn test_topic_name_becomes_title() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);
        cache.store_class_data_if_needed("8", Language::English).await.unwrap();

        let topics = cache.topics_for_class("8").unwrap();
        assert_eq!(topics[0].title, "Algebra Basics");
        assert_eq!(topics[0].language, "English");
        assert!(topics[0].has_article());
        assert!(topics[0].has_quiz());
        assert_eq!(topics[0].quiz.as_ref().unwrap()[0].answer_index, 1);
        assert!(topics[1].has_video());
        assert!(!topics[2].has_quiz());

        let fetched = cache.get_topic(&topics[0].id).unwrap().unwrap();
        assert_eq!(fetched, topics[0]);
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::failing();
        let cache = TopicCache::new(&db, &feed);

        let err = cache.store_class_data_if_needed("9", Language::English).await;
        assert!(matches!(err, Err(Error::FeedStatus { status: 500, .. })));
        assert!(cache.get_all_topics().unwrap().is_empty());
        assert!(!cache.class_has_topics("9").unwrap());
    }

    #[tokio::test]
    async fn test_failed_check_still_attempts_hydration() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute("DROP TABLE topics", []).unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);

        let result = cache.store_class_data_if_needed("8", Language::English).await;

        assert_eq!(feed.fetches(), 1);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_search_content() {
        let db = Database::open_in_memory().unwrap();
        let feed = StubFeed::serving(class_eight());
        let cache = TopicCache::new(&db, &feed);
        cache.store_class_data_if_needed("8", Language::English).await.unwrap();
        cache
            .ingest("9", vec![json!({"topic": "Algebra II", "language": "English"})])
            .unwrap();

        let hits = cache.search_content("algebra", "8");
        let titles: Vec<_> = hits.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Algebra Basics", "Linear Algebra Preview"]);
        assert!(hits.iter().all(|t| t.class == "8"));

        assert!(cache.search_content("ALGEBRA", "8").len() == 2);
        assert!(cache.search_content("algebra", "10").is_empty());
        assert_eq!(cache.search_content("", "8").len(), 3);
    }

    #[test]
    fn test_search_on_broken_store_is_empty() {
        let db = Database::open_in_memory().unwrap();
        db.conn().execute("DROP TABLE topics", []).unwrap();
        let feed = StubFeed::failing();
        let cache = TopicCache::new(&db, &feed);

        assert!(cache.search_content("algebra", "8").is_empty());
    }
}
