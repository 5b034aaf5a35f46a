pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, header, info, section, success, topic_line, warn};
pub use progress::Spinner;
pub use table::{leaderboard_table, profiles_table, stats_table, topics_table};
pub use theme::{theme, Theme};
