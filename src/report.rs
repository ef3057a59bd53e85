//! Plain-text and JSON rendering of [`QueryResults`], shared by `--report` and the results panel.

use color_eyre::Result;
use std::fmt::Write;

use crate::query::QueryResults;

/// The six result blocks in the order they are always shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultSection {
    TweetsPerDay,
    UniqueUsers,
    AverageLikes,
    PlaceIds,
    TweetsByTime,
    TopUser,
}

impl ResultSection {
    pub const ALL: [Self; 6] = [
        Self::TweetsPerDay,
        Self::UniqueUsers,
        Self::AverageLikes,
        Self::PlaceIds,
        Self::TweetsByTime,
        Self::TopUser,
    ];

    pub fn heading(self, term: &str) -> String {
        match self {
            Self::TweetsPerDay => format!("Tweets per day containing '{}'", term),
            Self::UniqueUsers => format!("Unique users who tweeted about '{}'", term),
            Self::AverageLikes => format!("Average number of likes for tweets containing '{}'", term),
            Self::PlaceIds => format!("Places (IDs) from which tweets about '{}' originated", term),
            Self::TweetsByTime => format!("Time of day when tweets about '{}' were posted", term),
            Self::TopUser => format!("User who posted the most tweets containing '{}'", term),
        }
    }

    /// Body lines for this section.
    pub fn body(self, results: &QueryResults) -> Vec<String> {
        match self {
            Self::TweetsPerDay => {
                if results.tweets_per_day.is_empty() {
                    return vec![NO_MATCHES.to_string()];
                }
                results
                    .tweets_per_day
                    .iter()
                    .map(|(date, n)| format!("{}  {}", date.format("%Y-%m-%d"), n))
                    .collect()
            }
            Self::UniqueUsers => vec![results.unique_users.to_string()],
            Self::AverageLikes => vec![format_average_likes(results.average_likes)],
            Self::PlaceIds => {
                if results.place_ids.is_empty() {
                    vec!["(none)".to_string()]
                } else {
                    results.place_ids.clone()
                }
            }
            Self::TweetsByTime => {
                if results.tweets_by_time.is_empty() {
                    return vec![NO_MATCHES.to_string()];
                }
                results
                    .tweets_by_time
                    .iter()
                    .map(|(hour, n)| format!("{:02}:00  {}", hour, n))
                    .collect()
            }
            Self::TopUser => vec![format_top_user(results.top_user.as_deref())],
        }
    }
}

pub const NO_MATCHES: &str = "no matching posts";

pub fn results_heading(term: &str) -> String {
    format!("Results for the term: {}", term)
}

/// Mean likes with two decimals, or "undefined" when there was nothing to average.
pub fn format_average_likes(average: Option<f64>) -> String {
    match average {
        Some(mean) => format!("{:.2}", mean),
        None => "undefined".to_string(),
    }
}

pub fn format_top_user(top: Option<&str>) -> String {
    top.map(str::to_string)
        .unwrap_or_else(|| NO_MATCHES.to_string())
}

/// Human-readable report with one block per section.
pub fn render_text(results: &QueryResults) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", results_heading(&results.term));
    for section in ResultSection::ALL {
        let _ = writeln!(out);
        let _ = writeln!(out, "### {}:", section.heading(&results.term));
        for line in section.body(results) {
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

pub fn render_json(results: &QueryResults) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
