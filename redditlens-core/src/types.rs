use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of looking a subreddit up on Reddit. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubredditInfo {
    pub name: String,
    pub exists: bool,
    /// The subreddit exists but is private, quarantined or otherwise closed to the app.
    pub restricted: bool,
    pub subscriber_count: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub over18: bool,
    pub url: Option<String>,
}

impl SubredditInfo {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            restricted: false,
            subscriber_count: None,
            title: None,
            description: None,
            over18: false,
            url: None,
        }
    }

    /// Whether the extraction job can read posts from this subreddit.
    pub fn is_usable(&self) -> bool {
        self.exists && !self.restricted
    }
}

/// One extracted post as the storage layer holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: Option<String>,
    pub title: String,
    pub score: i64,
    pub num_comments: i64,
    pub author: String,
    pub created_at: Option<DateTime<Utc>>,
    pub upvote_ratio: Option<f64>,
    pub url: String,
    pub nsfw: bool,
    pub edited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    Warehouse,
    LocalFiles,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Warehouse => write!(f, "warehouse"),
            DataSource::LocalFiles => write!(f, "local files"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthTarget {
    RedditApi,
    Warehouse,
}

impl fmt::Display for HealthTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthTarget::RedditApi => write!(f, "Reddit API"),
            HealthTarget::Warehouse => write!(f, "warehouse"),
        }
    }
}

/// Outcome of a single connection test. Built fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionHealth {
    pub target: HealthTarget,
    pub reachable: bool,
    pub detail: String,
}

impl ConnectionHealth {
    pub fn reachable(target: HealthTarget, detail: impl Into<String>) -> Self {
        Self {
            target,
            reachable: true,
            detail: detail.into(),
        }
    }

    pub fn unreachable(target: HealthTarget, detail: impl Into<String>) -> Self {
        Self {
            target,
            reachable: false,
            detail: detail.into(),
        }
    }
}

/// Extraction timestamp bounds of one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub source: DataSource,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub row_count: u64,
}

impl Freshness {
    pub fn empty(source: DataSource) -> Self {
        Self {
            source,
            oldest: None,
            newest: None,
            row_count: 0,
        }
    }

    /// Widens the bounds to include `timestamp` and counts one row.
    pub fn observe(&mut self, timestamp: Option<DateTime<Utc>>) {
        self.row_count += 1;
        if let Some(ts) = timestamp {
            self.oldest = Some(self.oldest.map_or(ts, |current| current.min(ts)));
            self.newest = Some(self.newest.map_or(ts, |current| current.max(ts)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Time elapsed since the newest record, clamped at zero.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.newest
            .map(|newest| (now - newest).max(Duration::zero()))
    }

    /// Whole days between the oldest and the newest record.
    pub fn span_days(&self) -> Option<i64> {
        match (self.oldest, self.newest) {
            (Some(oldest), Some(newest)) => Some((newest - oldest).num_days()),
            _ => None,
        }
    }

    /// A source with no timestamps is always stale.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age(now).map_or(true, |age| age > threshold)
    }
}

/// Aggregates shown on the status page for the locally extracted posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_posts: u64,
    pub total_score: i64,
    pub total_comments: i64,
    pub unique_authors: u64,
    pub nsfw_count: u64,
    pub edited_count: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl DatasetSummary {
    pub fn average_score(&self) -> f64 {
        if self.total_posts == 0 {
            0.0
        } else {
            self.total_score as f64 / self.total_posts as f64
        }
    }

    pub fn average_comments(&self) -> f64 {
        if self.total_posts == 0 {
            0.0
        } else {
            self.total_comments as f64 / self.total_posts as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_freshness_observe_tracks_bounds() {
        let mut freshness = Freshness::empty(DataSource::LocalFiles);
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap();

        freshness.observe(Some(late));
        freshness.observe(None);
        freshness.observe(Some(early));

        assert_eq!(freshness.row_count, 3);
        assert_eq!(freshness.oldest, Some(early));
        assert_eq!(freshness.newest, Some(late));
        assert_eq!(freshness.span_days(), Some(10));
    }

    #[test]
    fn test_staleness() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut freshness = Freshness::empty(DataSource::Warehouse);
        assert!(freshness.is_stale(now, Duration::hours(24)));

        freshness.observe(Some(now - Duration::hours(2)));
        assert_eq!(freshness.age(now), Some(Duration::hours(2)));
        assert!(!freshness.is_stale(now, Duration::hours(24)));
        assert!(freshness.is_stale(now, Duration::hours(1)));
    }

    #[test]
    fn test_future_timestamps_have_zero_age() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut freshness = Freshness::empty(DataSource::Warehouse);
        freshness.observe(Some(now + Duration::minutes(5)));
        assert_eq!(freshness.age(now), Some(Duration::zero()));
    }

    #[test]
    fn test_summary_averages() {
        let summary = DatasetSummary {
            total_posts: 4,
            total_score: 10,
            total_comments: 6,
            ..Default::default()
        };
        assert_eq!(summary.average_score(), 2.5);
        assert_eq!(summary.average_comments(), 1.5);
        assert_eq!(DatasetSummary::default().average_score(), 0.0);
    }
}
