mod common;

use color_eyre::Result;
use potato::chart_export::export_charts;
use potato::loader::load_path;
use potato::report::{render_json, render_text, ResultSection};
use potato::{run_all, ChartFormat, OpenOptions};
use tempfile::TempDir;

#[test]
fn test_text_report_for_three_posts() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let text = render_text(&run_all(&dataset, "Britney")?);

    assert!(text.starts_with("Results for the term: Britney"));
    assert!(text.contains("2024-01-01  2"));
    assert!(text.contains("15.00"));
    assert!(text.contains("10:00  1"));
    assert!(text.contains("alice"));

    let mut last = 0;
    for section in ResultSection::ALL {
        let at = text
            .find(&section.heading("Britney"))
            .expect("every section is printed");
        assert!(at >= last);
        last = at;
    }
    Ok(())
}

#[test]
fn test_text_report_without_matches() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let text = render_text(&run_all(&dataset, "madonna")?);
    assert!(text.contains("undefined"));
    assert!(!text.contains("0.00"));
    Ok(())
}

#[test]
fn test_json_report_fields() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let json: serde_json::Value = serde_json::from_str(&render_json(&run_all(&dataset, "Britney")?)?)?;

    assert_eq!(json["term"], "Britney");
    assert_eq!(json["tweets_per_day"]["2024-01-01"], 2);
    assert_eq!(json["unique_users"], 2);
    assert_eq!(json["average_likes"], 15.0);
    assert_eq!(json["place_ids"], serde_json::json!(["p1", "p2"]));
    assert_eq!(json["tweets_by_time"]["15"], 1);
    assert_eq!(json["top_user"], "alice");

    let empty: serde_json::Value = serde_json::from_str(&render_json(&run_all(&dataset, "madonna")?)?)?;
    assert!(empty["average_likes"].is_null());
    assert!(empty["top_user"].is_null());
    Ok(())
}

#[test]
fn test_export_eps_charts() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_generated(dir.path(), 60), &OpenOptions::new())?;
    let results = run_all(&dataset, "britney")?;
    let out = dir.path().join("charts");

    let eps = export_charts(&results, &out, ChartFormat::Eps)?;
    assert_eq!(eps.len(), 2);
    for path in &eps {
        let body = std::fs::read_to_string(path)?;
        assert!(body.starts_with("%!PS-Adobe"));
    }
    Ok(())
}

#[test]
fn test_export_without_matches_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let dataset = load_path(&common::write_three_posts(dir.path()), &OpenOptions::new())?;
    let results = run_all(&dataset, "madonna")?;
    assert!(export_charts(&results, dir.path(), ChartFormat::Eps).is_err());
    Ok(())
}
