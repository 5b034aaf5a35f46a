use crate::leaderboard::Standing;
use crate::profile::Profile;
use crate::topic::Topic;
use std::collections::BTreeSet;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    active: &'static str,
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Language")]
    language: String,
}

#[derive(Tabled)]
struct TopicRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Quiz")]
    quiz: usize,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Id")]
    id: String,
}

#[derive(Tabled)]
struct LeaderRow {
    #[tabled(rename = "Rank")]
    rank: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Time")]
    time: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

/// mm:ss
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn profiles_table(profiles: &[Profile], active_id: Option<i64>) -> String {
    render(
        profiles
            .iter()
            .map(|p| ProfileRow {
                active: if Some(p.id) == active_id { "*" } else { "" },
                id: p.id,
                name: p.name.clone(),
                class: p.class.clone(),
                language: p.language.to_string(),
            })
            .collect(),
    )
}

pub fn topics_table(topics: &[Topic], completed: &BTreeSet<String>) -> String {
    render(
        topics
            .iter()
            .map(|t| TopicRow {
                title: t.title.clone(),
                quiz: t.quiz_len(),
                done: if completed.contains(&t.id) { "✓" } else { "" },
                id: t.id.clone(),
            })
            .collect(),
    )
}

pub fn leaderboard_table(standing: &Standing, max_score: u32) -> String {
    render(
        standing
            .window
            .iter()
            .map(|r| LeaderRow {
                rank: if r.entry.is_student {
                    format!("#{} (you)", r.rank)
                } else {
                    format!("#{}", r.rank)
                },
                name: r.entry.name.clone(),
                score: format!("{}/{}", r.entry.score, max_score),
                time: format_time(r.entry.time_secs),
            })
            .collect(),
    )
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    render(
        stats
            .iter()
            .map(|(label, value)| StatRow {
                metric: label.to_string(),
                value: value.clone(),
            })
            .collect(),
    )
}
