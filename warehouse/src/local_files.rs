//! Extracted posts on local disk: the CSV files the extraction job writes
//! before they are uploaded. The first data directory holding any `.csv`
//! wins; the files in it are read in name order and a post that appears in
//! more than one file keeps its last occurrence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use redditlens_core::{
    CoreError, DataSource, DatasetSummary, ExtractionRecord, ExtractionSource, Freshness,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SOURCE_NAME: &str = "local files";

/// Column layout of an extraction CSV. Every column is optional so older
/// files with fewer columns still load.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: Option<String>,
    title: Option<String>,
    score: Option<String>,
    num_comments: Option<String>,
    author: Option<String>,
    created_utc: Option<String>,
    url: Option<String>,
    upvote_ratio: Option<String>,
    over_18: Option<String>,
    edited: Option<String>,
}

impl From<CsvRow> for ExtractionRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            id: row.id.filter(|id| !id.trim().is_empty()),
            title: row.title.unwrap_or_default(),
            score: row.score.as_deref().and_then(parse_count).unwrap_or(0),
            num_comments: row.num_comments.as_deref().and_then(parse_count).unwrap_or(0),
            author: row.author.unwrap_or_default(),
            created_at: row.created_utc.as_deref().and_then(parse_timestamp),
            upvote_ratio: row
                .upvote_ratio
                .as_deref()
                .and_then(|raw| raw.trim().parse().ok()),
            url: row.url.unwrap_or_default(),
            nsfw: row.over_18.as_deref().map_or(false, parse_flag),
            edited: row.edited.as_deref().map_or(false, parse_flag),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalFiles {
    data_dirs: Vec<PathBuf>,
}

impl LocalFiles {
    pub fn new(data_dirs: Vec<PathBuf>) -> Self {
        Self { data_dirs }
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    /// CSV files of the first directory that has any. An existing directory
    /// with no CSVs in it yields an empty list; no existing directory at all
    /// is `SourceUnavailable`.
    pub fn locate_files(&self) -> Result<Vec<PathBuf>, CoreError> {
        let mut any_dir_readable = false;

        for dir in &self.data_dirs {
            if !dir.is_dir() {
                debug!("Skipping data directory {}: not a directory", dir.display());
                continue;
            }
            any_dir_readable = true;

            let files: Vec<PathBuf> = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Could not list an entry in {}: {}", dir.display(), e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && is_csv(entry.path()))
                .map(|entry| entry.into_path())
                .collect();

            if !files.is_empty() {
                debug!("Found {} CSV files in {}", files.len(), dir.display());
                return Ok(files);
            }
        }

        if any_dir_readable {
            Ok(Vec::new())
        } else {
            Err(CoreError::source_unavailable(
                SOURCE_NAME,
                format!(
                    "none of the data directories exist ({})",
                    self.data_dirs
                        .iter()
                        .map(|dir| dir.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ))
        }
    }

    /// All extracted posts, deduplicated by id.
    pub fn load_records(&self) -> Result<Vec<ExtractionRecord>, CoreError> {
        let files = self.locate_files()?;

        let mut records: Vec<ExtractionRecord> = Vec::new();
        for file in &files {
            match read_csv(file) {
                Ok(mut rows) => records.append(&mut rows),
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }

        Ok(dedup_last_wins(records))
    }

    pub fn dataset_summary(&self) -> Result<DatasetSummary, CoreError> {
        Ok(summarize(&self.load_records()?))
    }
}

#[async_trait]
impl ExtractionSource for LocalFiles {
    fn kind(&self) -> DataSource {
        DataSource::LocalFiles
    }

    async fn freshness(&self) -> Result<Freshness, CoreError> {
        let files = self.clone();
        let records = tokio::task::spawn_blocking(move || files.load_records())
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("File scan task failed: {}", e),
            })??;

        let mut freshness = Freshness::empty(DataSource::LocalFiles);
        for record in &records {
            freshness.observe(record.created_at);
        }
        info!("Local files hold {} posts", freshness.row_count);
        Ok(freshness)
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

fn read_csv(path: &Path) -> Result<Vec<ExtractionRecord>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        match row {
            Ok(row) => records.push(row.into()),
            // Row 1 is the header.
            Err(e) => warn!("Skipping row {} of {}: {}", index + 2, path.display(), e),
        }
    }

    debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Keeps the last occurrence of each id at the position of its first one.
/// Rows without an id are never merged.
pub fn dedup_last_wins(records: Vec<ExtractionRecord>) -> Vec<ExtractionRecord> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<ExtractionRecord> = Vec::with_capacity(records.len());

    for record in records {
        match record.id.clone() {
            Some(id) => match slots.get(&id) {
                Some(&slot) => deduped[slot] = record,
                None => {
                    slots.insert(id, deduped.len());
                    deduped.push(record);
                }
            },
            None => deduped.push(record),
        }
    }

    deduped
}

pub fn summarize(records: &[ExtractionRecord]) -> DatasetSummary {
    let mut summary = DatasetSummary::default();
    let mut authors: HashSet<&str> = HashSet::new();
    let mut bounds = Freshness::empty(DataSource::LocalFiles);

    for record in records {
        summary.total_posts += 1;
        summary.total_score = summary.total_score.saturating_add(record.score);
        summary.total_comments = summary.total_comments.saturating_add(record.num_comments);
        if record.nsfw {
            summary.nsfw_count += 1;
        }
        if record.edited {
            summary.edited_count += 1;
        }
        if !record.author.is_empty() {
            authors.insert(record.author.as_str());
        }
        bounds.observe(record.created_at);
    }

    summary.unique_authors = authors.len() as u64;
    summary.oldest = bounds.oldest;
    summary.newest = bounds.newest;
    summary
}

/// Epoch seconds, `YYYY-MM-DD HH:MM:SS`, or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<f64>() {
        if !seconds.is_finite() {
            return None;
        }
        return Utc.timestamp_opt(seconds.trunc() as i64, 0).single();
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Integers, also when written as floats (`12.0`).
fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}

/// `edited` holds either a boolean or the epoch time of the edit.
fn parse_flag(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "0.0" | "no" | "none" | "nan" => false,
        "true" | "1" | "yes" => true,
        other => other.parse::<f64>().map_or(false, |value| value != 0.0),
    }
}
