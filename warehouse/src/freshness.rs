use redditlens_core::{
    ConnectionHealth, ConnectionProbe, CoreError, DataSource, ErrorExt, ExtractionSource,
    Freshness, HealthTarget,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Answers "how fresh is the extracted data" and "can we reach X" for the
/// status page. Holds no state between calls.
pub struct FreshnessReporter {
    sources: HashMap<DataSource, Arc<dyn ExtractionSource>>,
    probes: HashMap<HealthTarget, Arc<dyn ConnectionProbe>>,
    timeout: Duration,
}

impl FreshnessReporter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sources: HashMap::new(),
            probes: HashMap::new(),
            timeout,
        }
    }

    /// Registers a source under its own kind, replacing any earlier one.
    pub fn with_source(mut self, source: Arc<dyn ExtractionSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ConnectionProbe>) -> Self {
        self.probes.insert(probe.target(), probe);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// An empty but reachable source comes back with `row_count == 0` and no
    /// timestamps. A source that cannot be queried is `SourceUnavailable`.
    pub async fn data_freshness(&self, source: DataSource) -> Result<Freshness, CoreError> {
        let name = source.to_string();
        let extraction_source = self
            .sources
            .get(&source)
            .ok_or_else(|| CoreError::source_unavailable(name.as_str(), "not configured"))?;

        let freshness = tokio::time::timeout(self.timeout, extraction_source.freshness())
            .await
            .map_err(|_| {
                warn!("{} gave no answer within {:?}", name, self.timeout);
                CoreError::Timeout {
                    after: self.timeout,
                }
                .into_source_unavailable(&name)
            })?
            .map_err(|e| e.into_source_unavailable(&name))?;

        info!(
            "Freshness of {}: {} rows, newest {:?}",
            name, freshness.row_count, freshness.newest
        );
        Ok(freshness)
    }

    /// Never fails: an unreachable target is reported, not raised.
    pub async fn test_connection(&self, target: HealthTarget) -> ConnectionHealth {
        let Some(probe) = self.probes.get(&target) else {
            warn!("No connection probe registered for {}", target);
            return ConnectionHealth::unreachable(target, "not configured");
        };

        match tokio::time::timeout(self.timeout, probe.ping()).await {
            Ok(Ok(detail)) => {
                info!("{} is reachable: {}", target, detail);
                ConnectionHealth::reachable(target, detail)
            }
            Ok(Err(e)) => {
                e.log_warn();
                ConnectionHealth::unreachable(target, failure_detail(&e))
            }
            Err(_) => {
                warn!("{} gave no answer within {:?}", target, self.timeout);
                let expired = CoreError::Timeout {
                    after: self.timeout,
                };
                ConnectionHealth::unreachable(target, expired.to_string())
            }
        }
    }
}

/// The user-facing hint plus the underlying cause for wrapped transport errors.
fn failure_detail(error: &CoreError) -> String {
    let hint = error.user_friendly_message();
    let cause = match error {
        CoreError::Config(inner) => inner.to_string(),
        CoreError::Database(inner) => inner.to_string(),
        CoreError::RedditApi(inner) => inner.to_string(),
        CoreError::Network(inner) => inner.to_string(),
        _ => return hint,
    };
    format!("{} ({})", hint, cause)
}
