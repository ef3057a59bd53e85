#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "text\tauthor_id\tauthor_handle\tlike_count\tplace_id\tcreated_at\tts1\tts2\n";

/// Two posts about Britney on 2024-01-01 (alice, bob) and one about Cher on 2024-01-02 (alice).
pub const THREE_POSTS: &str = "I love Britney\t1\talice\t10\tp1\t2024-01-01T10:00:00Z\t\t\n\
                               britney forever\t2\tbob\t20\tp2\t2024-01-01T15:30:00Z\t\t\n\
                               Cher is great\t1\talice\t5\tp3\t2024-01-02T09:00:00Z\t\t\n";

pub fn write_tsv(dir: &Path, name: &str, rows: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(HEADER.as_bytes()).unwrap();
    file.write_all(rows.as_bytes()).unwrap();
    path
}

pub fn write_three_posts(dir: &Path) -> PathBuf {
    write_tsv(dir, "posts.tsv", THREE_POSTS)
}

/// A larger file with a known shape: post `i` is by `user{i % 7}` at hour `i % 24`
/// on day `1 + i % 5`, and every third post mentions Britney.
pub fn write_generated(dir: &Path, n: usize) -> PathBuf {
    let rows: String = (0..n)
        .map(|i| {
            let text = if i % 3 == 0 {
                format!("post {} about BRITNEY", i)
            } else {
                format!("post {} about nothing", i)
            };
            format!(
                "{}\t{}\tuser{}\t{}\tplace{}\t2024-03-0{} {:02}:15:00\t\t\n",
                text,
                i % 7,
                i % 7,
                i % 11,
                i % 4,
                1 + i % 5,
                i % 24
            )
        })
        .collect();
    write_tsv(dir, "generated.tsv", &rows)
}
