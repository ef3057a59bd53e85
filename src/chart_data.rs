//! Turn query results into plottable series for the results panel and chart export.

use chrono::NaiveDate;

use crate::query::QueryResults;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
}

/// A single-series chart. Points are `(x, y)`; `labels[i]` names the x value of `points[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// Short name used for exported file names.
    pub slug: &'static str,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub points: Vec<(f64, f64)>,
}

impl ChartSpec {
    /// Bar chart of matching posts per day. X is the position of the day in the series.
    pub fn per_day(results: &QueryResults) -> Self {
        let (labels, points): (Vec<String>, Vec<(f64, f64)>) = results
            .tweets_per_day
            .iter()
            .enumerate()
            .map(|(i, (date, count))| (format_date(date), (i as f64, *count as f64)))
            .unzip();
        Self {
            kind: ChartKind::Bar,
            title: format!("Tweets per day: {}", results.term),
            slug: "per_day",
            x_label: "date".to_string(),
            y_label: "tweets".to_string(),
            labels,
            points,
        }
    }

    /// Line chart of matching posts per hour. X is the hour itself.
    pub fn per_hour(results: &QueryResults) -> Self {
        let (labels, points): (Vec<String>, Vec<(f64, f64)>) = results
            .tweets_by_time
            .iter()
            .map(|(hour, count)| (format!("{:02}", hour), (*hour as f64, *count as f64)))
            .unzip();
        Self {
            kind: ChartKind::Line,
            title: format!("Tweets by hour of day: {}", results.term),
            slug: "per_hour",
            x_label: "hour (UTC)".to_string(),
            y_label: "tweets".to_string(),
            labels,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// X bounds widened by half a step so bars and end points are not clipped.
    pub fn x_bounds(&self) -> [f64; 2] {
        match self.kind {
            ChartKind::Line => [0.0, 23.0],
            ChartKind::Bar => [-0.5, self.points.len().max(1) as f64 - 0.5],
        }
    }

    /// Y bounds from zero to the largest count, with a little headroom.
    pub fn y_bounds(&self) -> [f64; 2] {
        let max = self
            .points
            .iter()
            .map(|&(_, y)| y)
            .fold(0.0_f64, f64::max);
        [0.0, (max * 1.1).max(1.0)]
    }
}

/// Sum runs of neighbouring counts so at most `max` remain, keeping their order.
pub fn bucket_counts(values: &[u64], max: usize) -> Vec<u64> {
    if max == 0 {
        return Vec::new();
    }
    if values.len() <= max {
        return values.to_vec();
    }
    let per_bucket = values.len().div_ceil(max);
    values
        .chunks(per_bucket)
        .map(|chunk| chunk.iter().sum())
        .collect()
}

/// Counts for all 24 hours, zero where nothing matched.
pub fn hourly_counts(results: &QueryResults) -> Vec<u64> {
    (0..24)
        .map(|hour| results.tweets_by_time.get(&hour).copied().unwrap_or(0))
        .collect()
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Compact axis label: integers without decimals, large values with a k/M suffix.
pub fn format_axis_label(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}
