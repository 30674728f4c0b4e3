//! Collection overview for `devdoc stats`.
//!
//! Prints one line per corpus: record count, vector dimensionality, the
//! embedder that built it, on-disk size, and when it was last ingested.

use anyhow::Result;

use dev_documento_core::store::VectorStore;
use dev_documento_core::{CollectionInfo, Corpus};

use crate::config::Config;
use crate::sqlite_store::{corpus_db_path, SqliteStore};

/// Run the stats command: read collection metadata and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let dir = &config.store.dir;
    let any_present = Corpus::ALL
        .iter()
        .any(|c| corpus_db_path(dir, *c).exists());

    let mut rows: Vec<(Corpus, Option<CollectionInfo>, u64)> = Vec::new();
    if any_present {
        let store = SqliteStore::open(dir).await?;
        for corpus in Corpus::ALL {
            let info = store.collection_info(corpus).await?;
            let size = std::fs::metadata(corpus_db_path(dir, corpus))
                .map(|m| m.len())
                .unwrap_or(0);
            rows.push((corpus, info, size));
        }
        store.close().await;
    } else {
        rows.extend(Corpus::ALL.iter().map(|c| (*c, None, 0)));
    }

    println!("devdoc collections");
    println!("==================");
    println!();
    println!("  Store dir:   {}", dir.display());
    println!();
    println!(
        "  {:<10} {:>8} {:>6}  {:<28} {:>9}   {}",
        "CORPUS", "RECORDS", "DIMS", "EMBEDDER", "SIZE", "INGESTED"
    );
    println!("  {}", "-".repeat(84));

    for (corpus, info, size) in &rows {
        match info {
            Some(info) => println!(
                "  {:<10} {:>8} {:>6}  {:<28} {:>9}   {}",
                corpus.as_str(),
                info.record_count,
                info.dims,
                info.embedder,
                format_bytes(*size),
                format_ts_relative(info.ingested_at)
            ),
            None => println!("  {:<10} not ingested", corpus.as_str()),
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    match delta {
        d if d < 0 => format_ts_iso(ts),
        d if d < 60 => "just now".to_string(),
        d if d < 3600 => plural(d / 60, "min"),
        d if d < 86400 => plural(d / 3600, "hour"),
        d if d < 86400 * 30 => plural(d / 86400, "day"),
        _ => format_ts_iso(ts),
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_ts_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 120), "2 mins ago");
        assert_eq!(format_ts_relative(now - 3600), "1 hour ago");
        assert_eq!(format_ts_relative(now - 3 * 86400), "3 days ago");
        assert_eq!(format_ts_relative(0), "1970-01-01 00:00");
    }
}
