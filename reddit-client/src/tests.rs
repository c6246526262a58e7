use crate::api::{
    classify_about_error, parse_about, RedditApiClient, RedditSubredditData, SubredditLookup,
};
use crate::auth::{build_oauth_client, AppCredentials};
use crate::validator::{normalize_subreddit_name, SubredditSource, SubredditValidator};
use async_trait::async_trait;
use redditlens_core::{ConnectionProbe, CoreError, HealthTarget, RedditApiError, SubredditInfo};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn create_test_credentials() -> AppCredentials {
    AppCredentials::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "redditlens/0.1 by u/test_user".to_string(),
    )
}

fn python_data() -> RedditSubredditData {
    RedditSubredditData {
        display_name: "Python".to_string(),
        title: Some("Python".to_string()),
        public_description: Some("News about the programming language Python.".to_string()),
        subscribers: Some(1_300_000),
        over18: Some(false),
        url: Some("/r/Python/".to_string()),
        created_utc: Some(1201233135.0),
        subreddit_type: Some("public".to_string()),
    }
}

/// Answers from a fixed table and remembers which names were asked for.
struct FakeReddit {
    calls: AtomicUsize,
    asked: Mutex<Vec<String>>,
}

impl FakeReddit {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SubredditSource for FakeReddit {
    async fn lookup(&self, name: &str) -> Result<SubredditLookup, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.asked.lock().unwrap().push(name.to_string());
        match name.to_ascii_lowercase().as_str() {
            "python" => Ok(SubredditLookup::Found(python_data())),
            "secretclub" => classify_about_error(forbidden(name, Some("private"))),
            "blockedagent" => classify_about_error(forbidden(name, None)),
            "offline" => Err(CoreError::RedditApi(RedditApiError::ServerError {
                status_code: 503,
            })),
            "badcreds" => Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "invalid_client".to_string(),
            })),
            _ => Ok(SubredditLookup::NotFound),
        }
    }
}

fn forbidden(name: &str, reason: Option<&str>) -> CoreError {
    CoreError::RedditApi(RedditApiError::Forbidden {
        resource: format!("/r/{}/about", name),
        reason: reason.map(str::to_string),
    })
}

struct SlowReddit;

#[async_trait]
impl SubredditSource for SlowReddit {
    async fn lookup(&self, _name: &str) -> Result<SubredditLookup, CoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(SubredditLookup::NotFound)
    }
}

fn validator() -> SubredditValidator<FakeReddit> {
    SubredditValidator::new(FakeReddit::new(), Duration::from_secs(5))
}

#[test]
fn test_normalize_subreddit_name() {
    assert_eq!(normalize_subreddit_name("python").unwrap(), "python");
    assert_eq!(normalize_subreddit_name("r/python").unwrap(), "python");
    assert_eq!(normalize_subreddit_name("  /r/python/ ").unwrap(), "python");
    assert_eq!(normalize_subreddit_name("R/data_engineering").unwrap(), "data_engineering");
    assert!(matches!(
        normalize_subreddit_name("r/"),
        Err(CoreError::InvalidName { .. })
    ));
    assert!(matches!(
        normalize_subreddit_name("python/../admin"),
        Err(CoreError::InvalidName { .. })
    ));
    assert!(matches!(
        normalize_subreddit_name("data engineering"),
        Err(CoreError::InvalidName { .. })
    ));
}

#[tokio::test]
async fn test_prefix_is_stripped_before_lookup() {
    let validator = validator();

    let with_prefix = validator.validate("r/python").await.unwrap();
    let without_prefix = validator.validate("python").await.unwrap();

    assert_eq!(with_prefix, without_prefix);
    assert_eq!(
        *validator.source().asked.lock().unwrap(),
        vec!["python".to_string(), "python".to_string()]
    );
}

#[tokio::test]
async fn test_existing_subreddit() {
    let info = validator().validate("python").await.unwrap();

    assert!(info.exists);
    assert!(info.is_usable());
    assert_eq!(info.name, "Python");
    assert_eq!(info.subscriber_count, Some(1_300_000));
    assert_eq!(info.url.as_deref(), Some("https://reddit.com/r/Python"));
    assert!(info
        .description
        .as_deref()
        .unwrap()
        .contains("programming language"));
}

#[tokio::test]
async fn test_empty_names_never_reach_reddit() {
    let validator = validator();

    for name in ["", "   ", "r/", "\t\n"] {
        let result = validator.validate(name).await;
        assert!(
            matches!(result, Err(CoreError::InvalidName { .. })),
            "{name:?}"
        );
    }
    assert_eq!(validator.source().calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_subreddit_is_not_an_error() {
    let info = validator()
        .validate("thisSubredditDoesNotExist12345")
        .await
        .unwrap();

    assert!(!info.exists);
    assert!(!info.is_usable());
    assert_eq!(info, SubredditInfo::not_found("thisSubredditDoesNotExist12345"));
}

#[tokio::test]
async fn test_restricted_subreddit() {
    let info = validator().validate("r/secretclub").await.unwrap();

    assert!(info.exists);
    assert!(info.restricted);
    assert!(!info.is_usable());
    assert_eq!(info.subscriber_count, None);
}

#[tokio::test]
async fn test_failures_are_source_unavailable() {
    let validator = validator();

    for name in ["offline", "badcreds", "blockedagent"] {
        match validator.validate(name).await {
            Err(CoreError::SourceUnavailable { source_name, .. }) => {
                assert_eq!(source_name, "Reddit API")
            }
            other => panic!("Expected SourceUnavailable for {name}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let validator = SubredditValidator::new(SlowReddit, Duration::from_millis(50));

    let result = validator.validate("python").await;
    assert!(matches!(result, Err(CoreError::SourceUnavailable { .. })));
}

#[test]
fn test_parse_about_payloads() {
    let found = parse_about(json!({
        "kind": "t5",
        "data": {
            "display_name": "rust",
            "title": "The Rust Programming Language",
            "public_description": "",
            "subscribers": 300000,
            "over18": false,
            "url": "/r/rust/",
            "some_field_we_ignore": [1, 2, 3]
        }
    }))
    .unwrap();

    match found {
        SubredditLookup::Found(data) => {
            let info: SubredditInfo = data.into();
            assert_eq!(info.name, "rust");
            assert_eq!(info.description, None);
            assert_eq!(info.subscriber_count, Some(300000));
        }
        other => panic!("Expected Found, got {other:?}"),
    }

    // Search results come back as a listing when the name does not resolve.
    let listing = parse_about(json!({"kind": "Listing", "data": {"children": []}})).unwrap();
    assert_eq!(listing, SubredditLookup::NotFound);

    let broken = parse_about(json!({"kind": "t5", "data": {"title": "no name"}}));
    assert!(matches!(
        broken,
        Err(CoreError::RedditApi(RedditApiError::InvalidResponse { .. }))
    ));
}

#[test]
fn test_classify_about_error() {
    for reason in ["private", "quarantined", "gold_only"] {
        assert_eq!(
            classify_about_error(forbidden("secretclub", Some(reason))).unwrap(),
            SubredditLookup::Restricted
        );
    }

    let not_found = CoreError::RedditApi(RedditApiError::NotFound {
        resource: "/r/nothing/about".to_string(),
    });
    assert_eq!(
        classify_about_error(not_found).unwrap(),
        SubredditLookup::NotFound
    );

    for reason in [None, Some("blocked"), Some("")] {
        assert!(matches!(
            classify_about_error(forbidden("python", reason)),
            Err(CoreError::RedditApi(RedditApiError::Forbidden { .. }))
        ));
    }
    assert!(matches!(
        classify_about_error(CoreError::RedditApi(RedditApiError::InvalidToken)),
        Err(CoreError::RedditApi(RedditApiError::InvalidToken))
    ));
}

#[test]
fn test_oauth_client_requires_credentials() {
    let credentials = AppCredentials::new(
        "".to_string(),
        "secret".to_string(),
        "redditlens/0.1".to_string(),
    );
    let result = build_oauth_client(&credentials, "https://www.reddit.com/api/v1/access_token");
    assert!(matches!(
        result,
        Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. }))
    ));

    assert!(build_oauth_client(
        &create_test_credentials(),
        "https://www.reddit.com/api/v1/access_token"
    )
    .is_ok());
}

#[test]
fn test_credentials_debug_hides_secret() {
    let debug = format!("{:?}", create_test_credentials());
    assert!(debug.contains("test_client_id"));
    assert!(!debug.contains("test_client_secret"));
}

#[test]
fn test_api_client_creation() {
    let client = RedditApiClient::new(create_test_credentials(), Duration::from_secs(5)).unwrap();
    assert_eq!(client.user_agent(), "redditlens/0.1 by u/test_user");
    assert_eq!(client.target(), HealthTarget::RedditApi);

    let result = client.with_endpoints("not a url", "https://www.reddit.com/api/v1/access_token");
    assert!(matches!(result, Err(CoreError::Internal { .. })));
}

#[test]
fn test_unreachable_reddit_is_source_unavailable() {
    let client = RedditApiClient::new(create_test_credentials(), Duration::from_secs(2))
        .unwrap()
        .with_endpoints("http://127.0.0.1:9", "http://127.0.0.1:9/api/v1/access_token")
        .unwrap();
    let validator = SubredditValidator::new(client, Duration::from_secs(3));

    let result = tokio_test::block_on(validator.validate("python"));
    assert!(matches!(result, Err(CoreError::SourceUnavailable { .. })));
}
