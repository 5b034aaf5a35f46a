//! Simulated leaderboard
//!
//! There is no shared scoreboard, so the student's result is ranked against a
//! randomly generated roster. Nothing here touches storage; pass a seeded
//! RNG to get a reproducible board.

use rand::Rng;
use serde::Serialize;

const ROSTER_NAMES: &[&str] = &[
    "Alex", "Riya", "Sam", "John", "Priya", "Tina", "Rohit", "Zara", "Aman", "Lina",
];

/// Longest simulated completion time, in seconds
pub const MAX_SIMULATED_TIME_SECS: u32 = 600;

/// Default number of simulated students
pub const DEFAULT_ROSTER_SIZE: usize = 100;

/// One line of the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub score: u32,
    pub time_secs: u32,
    pub is_student: bool,
}

/// Board entry with its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: Entry,
}

/// The student's place on the board plus the slice worth showing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub out_of: usize,
    pub window: Vec<RankedEntry>,
}

/// Generate `size` simulated students scoring `0..=max_score`
pub fn simulate_roster<R: Rng + ?Sized>(size: usize, max_score: u32, rng: &mut R) -> Vec<Entry> {
    (0..size)
        .map(|_| Entry {
            name: format!(
                "{}{}",
                ROSTER_NAMES[rng.gen_range(0..ROSTER_NAMES.len())],
                rng.gen_range(0..100)
            ),
            score: rng.gen_range(0..=max_score),
            time_secs: rng.gen_range(0..MAX_SIMULATED_TIME_SECS),
            is_student: false,
        })
        .collect()
}

/// Rank the student against `roster`.
///
/// Higher score wins, then lower time. On a full tie the simulated entry
/// stays ahead of the student.
pub fn standing(name: &str, score: u32, time_secs: u32, roster: Vec<Entry>) -> Standing {
    let mut board = roster;
    board.push(Entry {
        name: name.to_string(),
        score,
        time_secs,
        is_student: true,
    });
    board.sort_by(|a, b| b.score.cmp(&a.score).then(a.time_secs.cmp(&b.time_secs)));

    let out_of = board.len();
    let rank = board.iter().position(|e| e.is_student).map_or(out_of, |i| i + 1);

    let (start, end) = if rank <= 10 {
        (0, out_of.min(15))
    } else if rank + 5 >= out_of {
        (out_of.saturating_sub(15), out_of)
    } else {
        (rank - 6, (rank + 5).min(out_of))
    };

    let window = board
        .into_iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(i, entry)| RankedEntry { rank: i + 1, entry })
        .collect();

    Standing { rank, out_of, window }
}

/// Rank a quiz result against a freshly simulated roster
pub fn rank<R: Rng + ?Sized>(
    name: &str,
    score: u32,
    time_secs: u32,
    max_score: u32,
    roster_size: usize,
    rng: &mut R,
) -> Standing {
    let roster = simulate_roster(roster_size, max_score, rng);
    standing(name, score, time_secs, roster)
}
