//! Checks a subreddit name against Reddit before it is written to the
//! extraction settings. Callers validate first and save second; the
//! configuration store has no network access of its own.

use crate::api::{RedditApiClient, SubredditLookup};
use async_trait::async_trait;
use redditlens_core::{CoreError, SubredditInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SOURCE_NAME: &str = "Reddit API";

#[async_trait]
pub trait SubredditSource: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<SubredditLookup, CoreError>;
}

#[async_trait]
impl SubredditSource for RedditApiClient {
    async fn lookup(&self, name: &str) -> Result<SubredditLookup, CoreError> {
        self.get_subreddit_about(name).await
    }
}

#[async_trait]
impl<S: SubredditSource + ?Sized> SubredditSource for Arc<S> {
    async fn lookup(&self, name: &str) -> Result<SubredditLookup, CoreError> {
        (**self).lookup(name).await
    }
}

pub struct SubredditValidator<S> {
    source: S,
    timeout: Duration,
}

impl<S: SubredditSource> SubredditValidator<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Not-found is an answer (`exists == false`), not an error. Failing to
    /// get an answer at all is `SourceUnavailable`.
    pub async fn validate(&self, raw_name: &str) -> Result<SubredditInfo, CoreError> {
        let name = normalize_subreddit_name(raw_name)?;

        let lookup = tokio::time::timeout(self.timeout, self.source.lookup(&name))
            .await
            .map_err(|_| {
                warn!(
                    "Lookup of r/{} gave no answer within {:?}",
                    name, self.timeout
                );
                CoreError::Timeout {
                    after: self.timeout,
                }
                .into_source_unavailable(SOURCE_NAME)
            })?
            .map_err(|e| e.into_source_unavailable(SOURCE_NAME))?;

        let info = match lookup {
            SubredditLookup::Found(data) => data.into(),
            SubredditLookup::Restricted => SubredditInfo {
                exists: true,
                restricted: true,
                url: Some(format!("https://reddit.com/r/{}", name)),
                ..SubredditInfo::not_found(name.as_str())
            },
            SubredditLookup::NotFound => SubredditInfo::not_found(name.as_str()),
        };

        info!(
            "Validated r/{}: exists={} restricted={}",
            info.name, info.exists, info.restricted
        );
        Ok(info)
    }
}

/// Trims whitespace, drops a leading `r/` (or `/r/`) and a trailing slash,
/// and rejects names Reddit could never accept.
pub fn normalize_subreddit_name(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let without_slash = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let name = match without_slash.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("r/") => &without_slash[2..],
        _ => without_slash,
    };
    let name = name.trim_end_matches('/').trim();

    if name.is_empty() {
        return Err(CoreError::InvalidName {
            name: raw.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(CoreError::InvalidName {
            name: raw.to_string(),
            reason: format!("contains '{}'; only letters, digits and _ are allowed", bad),
        });
    }

    Ok(name.to_string())
}
