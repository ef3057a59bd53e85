mod common;

use chrono::NaiveDate;
use color_eyre::Result;
use polars::prelude::*;
use potato::dataset::TEXT;
use potato::loader::load_path;
use potato::query::{self, filtered, filtered_count};
use potato::{run_all, OpenOptions};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_three_post_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let results = run_all(&dataset, "Britney")?;

    assert_eq!(
        results.tweets_per_day.into_iter().collect::<Vec<_>>(),
        vec![(date(2024, 1, 1), 2)]
    );
    assert_eq!(results.unique_users, 2);
    assert_eq!(results.average_likes, Some(15.0));
    assert_eq!(results.place_ids, vec!["p1", "p2"]);
    assert_eq!(
        results.tweets_by_time.into_iter().collect::<Vec<_>>(),
        vec![(10, 1), (15, 1)]
    );
    // alice and bob both have one post; alice comes first in the file.
    assert_eq!(results.top_user.as_deref(), Some("alice"));
    Ok(())
}

#[test]
fn test_filtered_rows_contain_term() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_generated(dir.path(), 90), &OpenOptions::new())?;

    let df = filtered(&dataset, "britney").collect()?;
    assert!(df.height() <= dataset.height());
    assert_eq!(df.height(), 30);
    for text in df.column(TEXT)?.str()?.into_iter().flatten() {
        assert!(text.to_lowercase().contains("britney"), "{text}");
    }
    Ok(())
}

#[test]
fn test_counts_add_up() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_generated(dir.path(), 120), &OpenOptions::new())?;

    for term in ["britney", "post 1", "nothing", ""] {
        let count = filtered_count(&dataset, term)?;
        let results = run_all(&dataset, term)?;
        assert_eq!(results.tweets_per_day.values().sum::<u64>(), count, "{term}");
        assert_eq!(results.tweets_by_time.values().sum::<u64>(), count, "{term}");
        assert!(results.unique_users <= count, "{term}");
        assert!(results.tweets_by_time.keys().all(|h| *h < 24));
    }
    Ok(())
}

#[test]
fn test_empty_term_matches_everything() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    assert_eq!(filtered_count(&dataset, "")?, 3);
    assert_eq!(query::unique_users(&dataset, "")?, 2);
    Ok(())
}

#[test]
fn test_case_insensitive() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_generated(dir.path(), 60), &OpenOptions::new())?;
    let lower = run_all(&dataset, "britney")?;
    let mixed = run_all(&dataset, "Britney")?;
    assert_eq!(lower.tweets_per_day, mixed.tweets_per_day);
    assert_eq!(lower.unique_users, mixed.unique_users);
    assert_eq!(lower.top_user, mixed.top_user);
    Ok(())
}

#[test]
fn test_queries_are_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_generated(dir.path(), 60), &OpenOptions::new())?;
    let first = run_all(&dataset, "britney")?;
    let second = run_all(&dataset, "britney")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_zero_matches() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let results = run_all(&dataset, "madonna")?;
    assert!(results.is_empty());
    assert!(results.tweets_per_day.is_empty());
    assert!(results.tweets_by_time.is_empty());
    assert_eq!(results.unique_users, 0);
    assert_eq!(results.average_likes, None);
    assert!(results.place_ids.is_empty());
    assert_eq!(results.top_user, None);
    Ok(())
}

#[test]
fn test_reload_gives_same_results() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_generated(dir.path(), 60);
    let first = load_path(&path, &OpenOptions::new())?;
    let second = load_path(&path, &OpenOptions::new())?;
    assert_eq!(first, second);
    assert_eq!(run_all(&first, "britney")?, run_all(&second, "britney")?);
    Ok(())
}

#[test]
fn test_missing_values_are_skipped() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_tsv(
        dir.path(),
        "gaps.tsv",
        "Britney one\t\t\t\t\t2024-05-01 08:00:00\t\t\n\
         Britney two\t7\tcarol\tlots\t\t2024-05-01 09:00:00\t\t\n\
         Britney three\t7\tcarol\t4\tp9\t2024-05-02 09:30:00\t\t\n",
    );
    let dataset = load_path(&path, &OpenOptions::new())?;
    let results = run_all(&dataset, "britney")?;
    assert_eq!(results.unique_users, 1);
    assert_eq!(results.average_likes, Some(4.0));
    assert_eq!(results.place_ids, vec!["p9"]);
    assert_eq!(results.top_user.as_deref(), Some("carol"));
    assert_eq!(results.tweets_by_time.get(&9), Some(&2));
    Ok(())
}

#[test]
fn test_offset_timestamps_count_on_utc_day() -> Result<()> {
    let dir = TempDir::new()?;
    let path = common::write_tsv(
        dir.path(),
        "offsets.tsv",
        "Britney late\t1\talice\t1\t\t2024-01-01T23:30:00-05:00\t\t\n\
         Britney early\t2\tbob\t1\t\t2024-01-01T12:00:00Z\t\t\n",
    );
    let dataset = load_path(&path, &OpenOptions::new())?;
    let results = run_all(&dataset, "britney")?;
    assert_eq!(
        results.tweets_per_day.into_iter().collect::<Vec<_>>(),
        vec![(date(2024, 1, 1), 1), (date(2024, 1, 2), 1)]
    );
    assert_eq!(results.tweets_by_time.get(&4), Some(&1));
    assert_eq!(results.tweets_by_time.get(&23), None);
    Ok(())
}

#[test]
fn test_in_memory_frame_via_df_macro() -> Result<()> {
    let df = df!(
        "text" => ["britney", "BRITNEY!", "cher"],
        "like_count" => ["1", "2", "3"],
    )?;
    let lf = df.lazy().filter(query::matches_term("Britney"));
    assert_eq!(lf.collect()?.height(), 2);
    Ok(())
}
