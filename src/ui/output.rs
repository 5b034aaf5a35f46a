use crate::topic::Topic;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::BOOKS, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// One topic in a listing: title, available material, completion mark
pub fn topic_line(topic: &Topic, completed: bool) {
    let mut material = Vec::new();
    if topic.has_article() {
        material.push(Icons::ARTICLE);
    }
    if topic.has_video() {
        material.push(Icons::VIDEO);
    }
    if topic.has_quiz() {
        material.push(Icons::QUIZ);
    }

    let mark = if completed {
        format!(" {}", Icons::DONE.style(theme().highlight.clone()))
    } else {
        String::new()
    };
    println!("- {}{} {}", topic.title, mark, material.join(" "));
    println!("  {}", dim(&topic.id));
}
