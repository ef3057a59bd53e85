//! Reads a tab-separated post file into a [`Dataset`].
//!
//! Loading is all-or-nothing: a bad `created_at` value or a missing required
//! column fails the whole load, while unparseable `ts1`/`ts2` values are kept
//! as missing.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use crate::dataset::{Dataset, CREATED_AT, REQUIRED_COLUMNS, TS1, TS2};
use crate::timestamp::{parse_timestamp, to_epoch_millis};
use crate::{CompressionFormat, OpenOptions};

pub const TAB: u8 = b'\t';

/// Extensions accepted for post files (before any compression extension).
const TSV_EXTENSIONS: [&str; 2] = ["tsv", "tab"];

/// True when the path names a `.tsv`/`.tab` file, optionally followed by a compression extension.
pub fn has_tsv_extension(path: &Path) -> bool {
    let stripped;
    let path = if CompressionFormat::from_extension(path).is_some() {
        stripped = path.with_extension("");
        stripped.as_path()
    } else {
        path
    };
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TSV_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Open, decompress if needed, and parse a post file.
pub fn load_path(path: &Path, options: &OpenOptions) -> Result<Dataset> {
    if !has_tsv_extension(path) {
        return Err(eyre!(
            "{} is not a tab-separated file (expected a .tsv or .tab extension)",
            path.display()
        ));
    }
    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));
    let bytes = read_source(path, compression)?;
    load_bytes(bytes, options)
}

/// Read the whole file into memory, decompressing on the way.
pub fn read_source(path: &Path, compression: Option<CompressionFormat>) -> Result<Vec<u8>> {
    let reader = BufReader::new(File::open(path)?);
    let mut decoder: Box<dyn Read> = match compression {
        None => Box::new(reader),
        Some(CompressionFormat::Gzip) => Box::new(flate2::read::GzDecoder::new(reader)),
        Some(CompressionFormat::Zstd) => Box::new(zstd::Decoder::new(reader)?),
        Some(CompressionFormat::Bzip2) => Box::new(bzip2::read::BzDecoder::new(reader)),
        Some(CompressionFormat::Xz) => Box::new(xz2::read::XzDecoder::new(reader)),
    };
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Parse an in-memory byte stream with a header row into a [`Dataset`].
pub fn load_bytes(bytes: Vec<u8>, options: &OpenOptions) -> Result<Dataset> {
    let separator = options.delimiter.unwrap_or(TAB);
    // Schema inference is off so identifiers keep their textual form.
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(separator).with_try_parse_dates(false));
    let mut df = CsvReader::new(Cursor::new(bytes))
        .with_options(read_options)
        .finish()?;

    trim_column_names(&mut df)?;
    check_required_columns(&df)?;

    coerce_timestamp_column(&mut df, TS1, false)?;
    coerce_timestamp_column(&mut df, TS2, false)?;
    coerce_timestamp_column(&mut df, CREATED_AT, true)?;

    tracing::debug!(rows = df.height(), columns = df.width(), "parsed post file");
    Ok(Dataset::new(df))
}

fn trim_column_names(df: &mut DataFrame) -> Result<()> {
    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    df.set_column_names(trimmed)?;
    Ok(())
}

fn check_required_columns(df: &DataFrame) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !present.iter().any(|name| name == required))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(eyre!("Missing required column(s): {}", missing.join(", ")))
    }
}

/// Replace a text column with a `Datetime(Milliseconds)` column.
///
/// With `strict`, the first value that is missing or cannot be parsed fails
/// the load; otherwise such values become null.
fn coerce_timestamp_column(df: &mut DataFrame, name: &str, strict: bool) -> Result<()> {
    let millis: Vec<Option<i64>> = {
        let values = df.column(name)?.str()?;
        let mut out = Vec::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            let parsed = value.and_then(parse_timestamp);
            if strict && parsed.is_none() {
                let shown = value
                    .map(|v| format!("'{}'", v))
                    .unwrap_or_else(|| "a missing value".to_string());
                return Err(eyre!(
                    "Invalid timestamp in column '{}' at row {}: {}",
                    name,
                    row + 1,
                    shown
                ));
            }
            out.push(parsed.as_ref().map(to_epoch_millis));
        }
        out
    };

    let series = Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    df.with_column(series)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "text\tauthor_id\tauthor_handle\tlike_count\tplace_id\tcreated_at\tts1\tts2\n";

    fn load(body: &str) -> Result<Dataset> {
        load_bytes(format!("{HEADER}{body}").into_bytes(), &OpenOptions::new())
    }

    #[test]
    fn test_has_tsv_extension() {
        assert!(has_tsv_extension(Path::new("posts.tsv")));
        assert!(has_tsv_extension(Path::new("posts.TAB")));
        assert!(has_tsv_extension(Path::new("posts.tsv.gz")));
        assert!(has_tsv_extension(Path::new("dir/posts.tsv.zst")));
        assert!(!has_tsv_extension(Path::new("posts.csv")));
        assert!(!has_tsv_extension(Path::new("posts.gz")));
        assert!(!has_tsv_extension(Path::new("posts")));
    }

    #[test]
    fn test_column_names_trimmed() {
        let bytes = " text \tauthor_id\t author_handle\tlike_count\tplace_id\tcreated_at \tts1\tts2\n\
                     hi\t1\talice\t3\t\t2024-01-01 10:00:00\t\t\n"
            .as_bytes()
            .to_vec();
        let dataset = load_bytes(bytes, &OpenOptions::new()).unwrap();
        assert_eq!(
            dataset.column_names(),
            REQUIRED_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_timestamp_columns_coerced() {
        let dataset = load("hi\t1\talice\t3\tp1\t2024-01-01T10:00:00Z\tgarbage\t2024-01-01\n").unwrap();
        let df = dataset.frame();
        assert_eq!(
            df.column(CREATED_AT).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(df.column(TS1).unwrap().null_count(), 1);
        assert_eq!(df.column(TS2).unwrap().null_count(), 0);
    }

    #[test]
    fn test_invalid_created_at_aborts() {
        let err = load(
            "ok\t1\talice\t3\t\t2024-01-01 10:00:00\t\t\n\
             bad\t2\tbob\t4\t\tyesterday\t\t\n",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("created_at"), "{msg}");
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("yesterday"), "{msg}");
    }

    #[test]
    fn test_missing_created_at_aborts() {
        let err = load("x\t1\talice\t3\t\t\t\t\n").unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn test_missing_required_columns_named() {
        let bytes = b"text\tauthor_id\nhi\t1\n".to_vec();
        let err = load_bytes(bytes, &OpenOptions::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("author_handle"), "{msg}");
        assert!(msg.contains("ts2"), "{msg}");
        assert!(!msg.contains("author_id,"), "{msg}");
    }

    #[test]
    fn test_extra_columns_tolerated() {
        let bytes = format!(
            "lang\t{}en\thi\t1\talice\t3\t\t2024-01-01 10:00:00\t\t\n",
            HEADER
        )
        .into_bytes();
        let dataset = load_bytes(bytes, &OpenOptions::new()).unwrap();
        assert_eq!(dataset.height(), 1);
        assert!(dataset.column_names().contains(&"lang".to_string()));
    }

    #[test]
    fn test_identifiers_stay_text() {
        let dataset = load("hi\t007\talice\t3\t\t2024-01-01 10:00:00\t\t\n").unwrap();
        let ids = dataset.frame().column("author_id").unwrap();
        assert_eq!(ids.dtype(), &DataType::String);
        assert_eq!(ids.str().unwrap().get(0), Some("007"));
    }

    #[test]
    fn test_header_only_file_loads_empty() {
        let dataset = load("").unwrap();
        assert_eq!(dataset.height(), 0);
    }

    #[test]
    fn test_custom_delimiter() {
        let bytes = b"text|author_id|author_handle|like_count|place_id|created_at|ts1|ts2\n\
                      hi|1|alice|3||2024-01-01 10:00:00||\n"
            .to_vec();
        let dataset = load_bytes(bytes, &OpenOptions::new().with_delimiter(b'|')).unwrap();
        assert_eq!(dataset.height(), 1);
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let err = load_path(Path::new("posts.csv"), &OpenOptions::new()).unwrap_err();
        assert!(err.to_string().contains("tab-separated"));
    }
}
