//! The six term queries.
//!
//! Each function builds its own plan from [`Dataset::lazy`] and the shared
//! [`matches_term`] predicate, so they can run in any order and never see each
//! other's intermediate frames.

use chrono::NaiveDate;
use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::{Dataset, AUTHOR_HANDLE, AUTHOR_ID, CREATED_AT, LIKE_COUNT, PLACE_ID, TEXT};
use crate::timestamp::date_from_epoch_days;

/// Case-insensitive substring match on `text`. Missing text never matches.
pub fn matches_term(term: &str) -> Expr {
    col(TEXT)
        .str()
        .to_lowercase()
        .str()
        .contains_literal(lit(term.to_lowercase()))
}

/// Posts whose text contains the term.
pub fn filtered(dataset: &Dataset, term: &str) -> LazyFrame {
    dataset.lazy().filter(matches_term(term))
}

pub fn filtered_count(dataset: &Dataset, term: &str) -> Result<u64> {
    let df = filtered(dataset, term)
        .select([len().cast(DataType::UInt64).alias("n")])
        .collect()?;
    Ok(df.column("n")?.u64()?.get(0).unwrap_or(0))
}

/// Matching posts per UTC calendar day of `created_at`, ascending. Days without matches are absent.
pub fn tweets_per_day(dataset: &Dataset, term: &str) -> Result<BTreeMap<NaiveDate, u64>> {
    let df = filtered(dataset, term)
        .group_by([col(CREATED_AT).dt().date().alias("date")])
        .agg([len().alias("count")])
        .select([
            col("date").cast(DataType::Int32),
            col("count").cast(DataType::UInt64),
        ])
        .collect()?;

    let dates = df.column("date")?.i32()?;
    let counts = df.column("count")?.u64()?;
    let mut out = BTreeMap::new();
    for (days, count) in dates.into_iter().zip(counts.into_iter()) {
        if let (Some(date), Some(count)) = (days.and_then(date_from_epoch_days), count) {
            out.insert(date, count);
        }
    }
    Ok(out)
}

/// Distinct non-missing `author_id` values among matching posts.
pub fn unique_users(dataset: &Dataset, term: &str) -> Result<u64> {
    let df = filtered(dataset, term)
        .select([col(AUTHOR_ID)
            .drop_nulls()
            .n_unique()
            .cast(DataType::UInt64)
            .alias("n")])
        .collect()?;
    Ok(df.column("n")?.u64()?.get(0).unwrap_or(0))
}

/// Mean `like_count` of matching posts, ignoring values that are missing or not numeric.
/// None when there is nothing to average.
pub fn average_likes(dataset: &Dataset, term: &str) -> Result<Option<f64>> {
    let df = filtered(dataset, term)
        .select([col(LIKE_COUNT)
            .cast(DataType::Float64)
            .mean()
            .alias("mean")])
        .collect()?;
    Ok(df
        .column("mean")?
        .f64()?
        .get(0)
        .filter(|mean| mean.is_finite()))
}

/// Distinct non-missing `place_id` values in the order they first appear.
pub fn place_ids(dataset: &Dataset, term: &str) -> Result<Vec<String>> {
    let df = filtered(dataset, term)
        .select([col(PLACE_ID).drop_nulls().unique_stable()])
        .collect()?;
    Ok(df
        .column(PLACE_ID)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

/// Matching posts per hour of day (0-23) of `created_at`, ascending. Hours without matches are absent.
pub fn tweets_by_time(dataset: &Dataset, term: &str) -> Result<BTreeMap<u32, u64>> {
    let df = filtered(dataset, term)
        .group_by([col(CREATED_AT).dt().hour().alias("hour")])
        .agg([len().alias("count")])
        .select([
            col("hour").cast(DataType::UInt32),
            col("count").cast(DataType::UInt64),
        ])
        .collect()?;

    let hours = df.column("hour")?.u32()?;
    let counts = df.column("count")?.u64()?;
    Ok(hours
        .into_iter()
        .zip(counts.into_iter())
        .filter_map(|(hour, count)| Some((hour?, count?)))
        .collect())
}

/// The `author_handle` with the most matching posts.
///
/// Ties go to the handle that appears first in the file. None when nothing matches.
pub fn top_user(dataset: &Dataset, term: &str) -> Result<Option<String>> {
    let df = filtered(dataset, term)
        .filter(col(AUTHOR_HANDLE).is_not_null())
        .group_by_stable([col(AUTHOR_HANDLE)])
        .agg([len().cast(DataType::UInt64).alias("count")])
        .collect()?;

    let handles = df.column(AUTHOR_HANDLE)?.str()?;
    let counts = df.column("count")?.u64()?;
    let mut best: Option<(&str, u64)> = None;
    for (handle, count) in handles.into_iter().zip(counts.into_iter()) {
        if let (Some(handle), Some(count)) = (handle, count) {
            // Strictly greater keeps the earliest handle on ties.
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((handle, count));
            }
        }
    }
    Ok(best.map(|(handle, _)| handle.to_string()))
}

/// All six results for one term, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResults {
    pub term: String,
    pub tweets_per_day: BTreeMap<NaiveDate, u64>,
    pub unique_users: u64,
    pub average_likes: Option<f64>,
    pub place_ids: Vec<String>,
    pub tweets_by_time: BTreeMap<u32, u64>,
    pub top_user: Option<String>,
}

impl QueryResults {
    /// True when no post matched the term.
    pub fn is_empty(&self) -> bool {
        self.tweets_per_day.is_empty()
    }
}

/// Run every query against the same dataset and term.
pub fn run_all(dataset: &Dataset, term: &str) -> Result<QueryResults> {
    Ok(QueryResults {
        term: term.to_string(),
        tweets_per_day: tweets_per_day(dataset, term)?,
        unique_users: unique_users(dataset, term)?,
        average_likes: average_likes(dataset, term)?,
        place_ids: place_ids(dataset, term)?,
        tweets_by_time: tweets_by_time(dataset, term)?,
        top_user: top_user(dataset, term)?,
    })
}
