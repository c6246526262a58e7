use chrono::Utc;
use config_store::{ConfigStore, Configuration};
use reddit_client::{AppCredentials, RedditApiClient, SubredditValidator};
use redditlens_core::{AppSettings, CoreError, DataSource, ErrorReporter, HealthTarget};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warehouse::{FreshnessReporter, LocalFiles, RedshiftTarget, RedshiftWarehouse};

const DEFAULT_LOG_FILTER: &str =
    "redditlens=info,config_store=info,reddit_client=info,warehouse=info";

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting redditlens pipeline status check");
    let reporter = ErrorReporter::new();

    let settings = AppSettings::from_env().map_err(|e| {
        reporter.report_error(&e);
        e
    })?;

    let store = ConfigStore::new(settings.config_path.clone());
    let issues = store.check();
    if issues.is_empty() {
        info!("{} is valid", store.path().display());
    }
    for issue in &issues {
        warn!("Configuration issue: {}", issue);
    }

    let local_files = LocalFiles::new(settings.data_dirs.clone());
    let mut freshness_reporter = FreshnessReporter::new(settings.request_timeout())
        .with_source(Arc::new(local_files.clone()));

    let config = match store.load() {
        Ok(config) => Some(config),
        Err(e) => {
            reporter.report_warning(&e);
            None
        }
    };

    if let Some(config) = &config {
        print_configuration(config);

        let credentials = AppCredentials::new(
            config.reddit.client_id.clone(),
            config.reddit.secret.clone(),
            settings.user_agent_for(&config.reddit.developer),
        );
        match RedditApiClient::new(credentials, settings.request_timeout()) {
            Ok(client) => {
                let client = Arc::new(client);
                freshness_reporter = freshness_reporter.with_probe(client.clone());
                check_subreddit(client, config, &settings, &reporter).await;
            }
            Err(e) => reporter.report_error(&e),
        }

        match RedshiftWarehouse::connect_lazy(
            RedshiftTarget::from(&config.aws),
            &settings.warehouse_table,
            settings.request_timeout(),
        ) {
            Ok(warehouse) => {
                let warehouse = Arc::new(warehouse);
                freshness_reporter = freshness_reporter
                    .with_source(warehouse.clone())
                    .with_probe(warehouse);
            }
            Err(e) => reporter.report_error(&e),
        }
    }

    for target in [HealthTarget::RedditApi, HealthTarget::Warehouse] {
        let health = freshness_reporter.test_connection(target).await;
        if health.reachable {
            info!("{}: reachable ({})", health.target, health.detail);
        } else {
            warn!("{}: unreachable ({})", health.target, health.detail);
        }
    }

    let now = Utc::now();
    for source in [DataSource::LocalFiles, DataSource::Warehouse] {
        match freshness_reporter.data_freshness(source).await {
            Ok(freshness) if freshness.is_empty() => info!("{}: no extracted posts yet", source),
            Ok(freshness) => {
                info!(
                    "{}: {} posts from {:?} to {:?} ({} days)",
                    source,
                    freshness.row_count,
                    freshness.oldest,
                    freshness.newest,
                    freshness.span_days().unwrap_or(0)
                );
                if freshness.is_stale(now, settings.stale_after()) {
                    warn!(
                        "{}: newest post is older than {} hours",
                        source, settings.stale_after_hours
                    );
                }
            }
            Err(e) => reporter.report_warning(&e),
        }
    }

    match local_files.dataset_summary() {
        Ok(summary) if summary.total_posts > 0 => info!(
            "Local dataset: {} posts by {} authors, avg score {:.1}, avg comments {:.1}, {} NSFW, {} edited",
            summary.total_posts,
            summary.unique_authors,
            summary.average_score(),
            summary.average_comments(),
            summary.nsfw_count,
            summary.edited_count
        ),
        Ok(_) => {}
        Err(e) => reporter.report_warning(&e),
    }

    Ok(())
}

fn print_configuration(config: &Configuration) {
    info!(
        "Extraction: r/{} (time_filter={}, limit={})",
        config.extraction.subreddit, config.extraction.time_filter, config.extraction.limit
    );
    info!(
        "Reddit app: {} (client_id {}) by u/{}",
        config.reddit.name, config.reddit.client_id, config.reddit.developer
    );
    for (key, value) in config.aws.redacted() {
        info!("aws_config.{} = {}", key, value);
    }
}

async fn check_subreddit(
    client: Arc<RedditApiClient>,
    config: &Configuration,
    settings: &AppSettings,
    reporter: &ErrorReporter,
) {
    let validator = SubredditValidator::new(client, settings.request_timeout());
    match validator.validate(&config.extraction.subreddit).await {
        Ok(info) if info.is_usable() => info!(
            "r/{} exists ({} subscribers)",
            info.name,
            info.subscriber_count
                .map_or_else(|| "unknown".to_string(), |count| count.to_string())
        ),
        Ok(info) if info.exists => warn!("r/{} exists but is restricted", info.name),
        Ok(info) => warn!("Configured subreddit r/{} does not exist", info.name),
        Err(e) => reporter.report_warning(&e),
    }
}
