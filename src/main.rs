//! EduBattle CLI - Command-line driver for the offline learning store

use clap::{Parser, Subcommand};
use edubattle::config::{self, EduBattleConfig, Settings};
use edubattle::leaderboard::{self, DEFAULT_ROSTER_SIZE};
use edubattle::ui::{self, Icons, Spinner};
use edubattle::{
    CompletionTracker, Database, FileMirror, Hydration, HttpContentFeed, Language, NewProfile,
    Profile, ProfileStore, TopicCache,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "edubattle")]
#[command(version)]
#[command(about = "Offline learning store - profiles, class topics and quiz progress")]
#[command(long_about = r#"
EduBattle keeps student profiles, class content and quiz progress in a local
database. Class content is downloaded from the content feed the first time a
class is used and served locally afterwards.

Example usage:
  edubattle profile create --name Asha --class 8 --language english
  edubattle topics search --query algebra
  edubattle quiz --topic <topic-id> --answers 1,0,2
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Base URL of the content feed (overrides config)
    #[arg(long, global = true)]
    feed_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Create, list and switch student profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Browse the active profile's class topics
    Topics {
        #[command(subcommand)]
        action: TopicsAction,
    },

    /// Submit quiz answers for a topic and see the leaderboard
    Quiz {
        /// Topic id
        #[arg(short, long)]
        topic: String,

        /// Chosen option indices, comma separated (0-based)
        #[arg(short, long, value_delimiter = ',')]
        answers: Vec<usize>,

        /// Seconds taken to finish the quiz
        #[arg(long, default_value = "0")]
        time: u32,

        /// Seed for the simulated leaderboard
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show completion progress for the active profile's class
    Progress,

    /// Show statistics about the local database
    Stats,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a profile and make it active
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        class: String,

        /// english or hindi
        #[arg(short, long, default_value = "english")]
        language: String,
    },

    /// List all profiles
    List,

    /// Make another profile active
    Switch {
        #[arg(long)]
        id: i64,
    },

    /// Show the active profile
    Show,
}

#[derive(Subcommand)]
enum TopicsAction {
    /// Download the active profile's class content if not stored yet
    Sync,

    /// List topics of the active profile's class
    List,

    /// Search topic titles in the active profile's class
    Search {
        #[arg(short, long)]
        query: String,
    },

    /// Show one topic
    Show {
        #[arg(long)]
        id: String,
    },
}

struct App {
    db: Database,
    feed: HttpContentFeed,
    mirror: FileMirror,
    json: bool,
}

impl App {
    fn open(settings: &Settings, json: bool) -> anyhow::Result<Self> {
        config::ensure_db_dir(&settings.database)?;
        let db = Database::open(&settings.database)?;
        let feed = HttpContentFeed::new(settings.feed_url.clone(), settings.timeout)?;
        let mirror = FileMirror::new(settings.mirror_dir.clone());
        Ok(Self { db, feed, mirror, json })
    }

    fn profiles(&self) -> ProfileStore<'_> {
        ProfileStore::new(&self.db)
    }

    fn topics(&self) -> TopicCache<'_> {
        TopicCache::new(&self.db, &self.feed)
    }

    fn completions(&self) -> CompletionTracker<'_> {
        CompletionTracker::new(&self.db, &self.mirror)
    }

    fn require_profile(&self) -> anyhow::Result<Profile> {
        match self.profiles().get_profile()? {
            Some(profile) => Ok(profile),
            None => anyhow::bail!("No active profile. Create one with `edubattle profile create`."),
        }
    }

    async fn hydrate(&self, profile: &Profile) -> anyhow::Result<()> {
        let spinner = Spinner::new(&format!("Loading class {} content...", profile.class));
        match self
            .topics()
            .store_class_data_if_needed(&profile.class, profile.language)
            .await
        {
            Ok(Hydration::AlreadyPresent) => {
                spinner.clear();
                Ok(())
            }
            Ok(Hydration::Fetched { stored, skipped }) => {
                spinner.finish_with_message(&format!(
                    "{} Downloaded {} topics for class {}",
                    Icons::DOWNLOAD,
                    stored,
                    profile.class
                ));
                if skipped > 0 {
                    ui::warn(&format!("Skipped {} invalid topic records", skipped));
                }
                Ok(())
            }
            Err(e) => {
                spinner.clear();
                Err(e.into())
            }
        }
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let base = std::env::current_dir()?;

    if let Commands::Config { action: ConfigAction::Init { force } } = &cli.command {
        let path = cli.config.clone().unwrap_or_else(config::default_config_path);
        config::write_config(&path, &EduBattleConfig::with_defaults(&base), *force)?;
        ui::success(&format!("Wrote {}", path.display()));
        return Ok(());
    }

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let settings = file_config.resolve(&base, cli.database.clone(), cli.feed_url.clone());
    tracing::debug!("Using settings {:?}", settings);
    let app = App::open(&settings, cli.json)?;

    match cli.command {
        Commands::Config { .. } => unreachable!("handled before opening the database"),

        Commands::Profile { action } => run_profile(&app, action).await?,

        Commands::Topics { action } => run_topics(&app, action).await?,

        Commands::Quiz { topic, answers, time, seed } => {
            let profile = app.require_profile()?;
            let Some(topic) = app.topics().get_topic(&topic)? else {
                anyhow::bail!(edubattle::Error::TopicNotFound(topic));
            };
            let Some(questions) = topic.quiz.as_deref().filter(|q| !q.is_empty()) else {
                anyhow::bail!("Topic '{}' has no quiz", topic.title);
            };

            let result = edubattle::quiz::score(questions, &answers);
            app.completions().mark_complete(profile.id, &topic.id)?;

            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let standing = leaderboard::rank(
                &profile.name,
                result.correct,
                time,
                result.total,
                DEFAULT_ROSTER_SIZE,
                &mut rng,
            );

            if app.json {
                app.print_json(&serde_json::json!({
                    "topic": topic.id,
                    "score": result,
                    "standing": standing,
                }))?;
            } else {
                ui::success(&format!("{}: scored {}", topic.title, result));
                ui::section(&format!(" {} Leaderboard ", Icons::TROPHY));
                println!("You ranked #{} out of {} students", standing.rank, standing.out_of);
                println!("{}", ui::leaderboard_table(&standing, result.total));
            }
        }

        Commands::Progress => {
            let profile = app.require_profile()?;
            let topics = app.topics().topics_for_class(&profile.class)?;
            let progress = app.completions().progress(profile.id, &topics)?;
            if app.json {
                app.print_json(&progress)?;
            } else {
                ui::header(&format!("Class {}, {}", profile.class, profile.name));
                println!(
                    "{} {}/{} topics complete ({}%)",
                    Icons::STATS,
                    progress.completed,
                    progress.total,
                    progress.percent()
                );
            }
        }

        Commands::Stats => {
            let stats = app.db.stats()?;
            if app.json {
                app.print_json(&stats)?;
            } else {
                println!("{} EduBattle Statistics ({})", Icons::STATS, settings.database.display());
                println!(
                    "{}",
                    ui::stats_table(&[
                        ("Schema version", stats.schema_version.to_string()),
                        ("Profiles", stats.profiles.to_string()),
                        ("Topics", stats.topics.to_string()),
                        ("Results", stats.results.to_string()),
                    ])
                );
            }
        }
    }

    Ok(())
}

async fn run_profile(app: &App, action: ProfileAction) -> anyhow::Result<()> {
    let store = app.profiles();
    match action {
        ProfileAction::Create { name, class, language } => {
            let language: Language = language.parse()?;
            let profile = store.save_profile(NewProfile::new(name, class, language).validate()?)?;
            ui::success(&format!("Welcome, {}! Profile {} is now active.", profile.name, profile.id));
            app.hydrate(&profile).await?;
        }

        ProfileAction::List => {
            let profiles = store.get_all_profiles()?;
            if app.json {
                app.print_json(&profiles)?;
            } else if profiles.is_empty() {
                println!("No profiles yet.");
            } else {
                println!("{}", ui::profiles_table(&profiles, store.active_profile_id()?));
            }
        }

        ProfileAction::Switch { id } => {
            store.set_active_profile(id)?;
            match store.get_profile()? {
                Some(profile) => {
                    ui::success(&format!("Switched to {} (class {})", profile.name, profile.class));
                    app.hydrate(&profile).await?;
                }
                None => ui::warn(&format!("Profile {} does not exist; no profile is active", id)),
            }
        }

        ProfileAction::Show => {
            let profile = store.get_profile()?;
            if app.json {
                app.print_json(&profile)?;
            } else {
                match profile {
                    Some(p) => {
                        ui::info("Name", &p.name);
                        ui::info("Class", &p.class);
                        ui::info("Language", p.language.as_str());
                        ui::info("Id", &p.id.to_string());
                    }
                    None => println!("No active profile."),
                }
            }
        }
    }
    Ok(())
}

async fn run_topics(app: &App, action: TopicsAction) -> anyhow::Result<()> {
    let profile = app.require_profile()?;
    let cache = app.topics();
    match action {
        TopicsAction::Sync => {
            app.hydrate(&profile).await?;
            let count = cache.topics_for_class(&profile.class)?.len();
            ui::success(&format!("Class {} has {} topics stored", profile.class, count));
        }

        TopicsAction::List => {
            let topics = cache.topics_for_class(&profile.class)?;
            let completed = app.completions().load_completed_topic_ids(profile.id)?;
            if app.json {
                app.print_json(&topics)?;
            } else if topics.is_empty() {
                println!("No topics found. Run `edubattle topics sync` to download them.");
            } else {
                println!("{}", ui::topics_table(&topics, &completed));
            }
        }

        TopicsAction::Search { query } => {
            let hits = cache.search_content(&query, &profile.class);
            let completed = app.completions().load_completed_topic_ids(profile.id)?;
            if app.json {
                app.print_json(&hits)?;
            } else if hits.is_empty() {
                println!("{} No topics found for '{}'.", Icons::SEARCH, query);
            } else {
                println!("{} {} topics matching '{}':", Icons::SEARCH, hits.len(), query);
                for topic in &hits {
                    ui::topic_line(topic, completed.contains(&topic.id));
                }
            }
        }

        TopicsAction::Show { id } => {
            let Some(topic) = cache.get_topic(&id)? else {
                anyhow::bail!(edubattle::Error::TopicNotFound(id));
            };
            if app.json {
                app.print_json(&topic)?;
            } else {
                ui::header(&topic.title);
                if let Some(article) = topic.article.as_deref().filter(|a| !a.is_empty()) {
                    ui::section(&format!(" {} Article ", Icons::ARTICLE));
                    println!("{}", article);
                }
                if let Some(video) = topic.video.as_deref().filter(|v| !v.is_empty()) {
                    ui::section(&format!(" {} Video ", Icons::VIDEO));
                    println!("{}", video);
                }
                if let Some(quiz) = topic.quiz.as_deref().filter(|q| !q.is_empty()) {
                    ui::section(&format!(" {} Quiz ", Icons::QUIZ));
                    for (i, q) in quiz.iter().enumerate() {
                        println!("{}. {}", i + 1, q.question);
                        for (j, option) in q.options.iter().enumerate() {
                            println!("   [{}] {}", j, option);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
