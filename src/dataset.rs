use polars::prelude::*;

pub const TEXT: &str = "text";
pub const AUTHOR_ID: &str = "author_id";
pub const AUTHOR_HANDLE: &str = "author_handle";
pub const LIKE_COUNT: &str = "like_count";
pub const PLACE_ID: &str = "place_id";
pub const CREATED_AT: &str = "created_at";
pub const TS1: &str = "ts1";
pub const TS2: &str = "ts2";

/// Columns a post file must provide. Anything else is carried along untouched.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    TEXT,
    AUTHOR_ID,
    AUTHOR_HANDLE,
    LIKE_COUNT,
    PLACE_ID,
    CREATED_AT,
    TS1,
    TS2,
];

/// The posts loaded from the most recently opened file.
///
/// Every column is kept as text except `created_at`, `ts1` and `ts2`, which are
/// `Datetime(Milliseconds)` holding UTC wall-clock values. Queries read it
/// through [`Dataset::lazy`], which hands out an independent plan over a cheap
/// clone of the frame, so nothing downstream can mutate the loaded data.
#[derive(Clone, Debug)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Parse a tab-separated byte stream with a header row.
    pub fn from_tsv_bytes(bytes: Vec<u8>, options: &crate::OpenOptions) -> color_eyre::Result<Self> {
        crate::loader::load_bytes(bytes, options)
    }

    pub fn lazy(&self) -> LazyFrame {
        self.df.clone().lazy()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// First `n` rows rendered as display strings; missing values become empty cells.
    pub fn preview_rows(&self, n: usize) -> Vec<Vec<String>> {
        let head = self.df.head(Some(n));
        (0..head.height())
            .map(|row| {
                head.get_columns()
                    .iter()
                    .map(|column| match column.get(row) {
                        Ok(AnyValue::Null) | Err(_) => String::new(),
                        Ok(value) => value.str_value().to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.df.equals_missing(&other.df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_rows_blank_for_missing() {
        let df = df!(
            "text" => [Some("hello"), None],
            "n" => ["1", "2"]
        )
        .unwrap();
        let dataset = Dataset::new(df);
        let rows = dataset.preview_rows(5);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["hello".to_string(), "1".to_string()]);
        assert_eq!(rows[1], vec![String::new(), "2".to_string()]);
    }

    #[test]
    fn test_preview_rows_limited() {
        let df = df!("text" => ["a", "b", "c"]).unwrap();
        let dataset = Dataset::new(df);
        assert_eq!(dataset.preview_rows(2).len(), 2);
        assert_eq!(dataset.height(), 3);
        assert_eq!(dataset.column_names(), vec!["text".to_string()]);
    }
}
