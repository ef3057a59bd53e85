//! Short, user-facing messages for load and query failures.
//!
//! Matches on `PolarsError` variants and `io::ErrorKind` instead of parsing
//! message text. Errors raised with `eyre!` already read well and pass through.

use color_eyre::eyre::Report;
use polars::prelude::PolarsError;
use std::io;
use std::path::Path;

pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("The file has no header row or data: {}", msg),
        PE::ComputeError(msg) => {
            let msg = msg.to_string();
            if msg.contains("found more fields than defined") {
                "Malformed TSV: a row has more fields than the header.".to_string()
            } else {
                msg.lines().next().unwrap_or("").trim().to_string()
            }
        }
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::Context { error, msg } => format!("{}: {}", msg, user_message_from_polars(error)),
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base = match err.kind() {
        ErrorKind::NotFound => "File not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data (is the compression format right?).".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::IsADirectory => "Path is a directory, not a file.".to_string(),
        _ => err.to_string(),
    };
    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Walk the cause chain for a `PolarsError` or `io::Error`; otherwise use the first line of the report.
pub fn user_message_from_report(report: &Report, path: Option<&Path>) -> String {
    let msg = report
        .chain()
        .find_map(|cause| {
            if let Some(pe) = cause.downcast_ref::<PolarsError>() {
                Some(user_message_from_polars(pe))
            } else {
                cause
                    .downcast_ref::<io::Error>()
                    .map(|e| user_message_from_io(e, None))
            }
        })
        .unwrap_or_else(|| {
            report
                .to_string()
                .lines()
                .next()
                .map(str::trim)
                .unwrap_or("An error occurred")
                .to_string()
        });
    match path {
        Some(p) => format!("Failed to load {}: {}", p.display(), msg),
        None => msg,
    }
}
