pub struct Icons;

impl Icons {
    pub const BOOKS: &str = "📚";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const DONE: &str = "✓";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const ARTICLE: &str = "📘";
    pub const VIDEO: &str = "🎥";
    pub const QUIZ: &str = "📝";
    pub const TROPHY: &str = "🏆";
    pub const DOWNLOAD: &str = "⬇️";
}
