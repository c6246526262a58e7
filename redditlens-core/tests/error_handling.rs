use redditlens_core::{
    ConfigError, CoreError, DatabaseError, ErrorExt, ErrorReporter, RedditApiError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let db_error = CoreError::Database(DatabaseError::ConnectionFailed {
        reason: "refused".to_string(),
    });
    assert_eq!(db_error.error_code(), "DATABASE");

    let missing = CoreError::Config(ConfigError::Missing {
        path: "configuration.conf".to_string(),
    });
    assert_eq!(missing.error_code(), "CONFIG_MISSING");

    let syntax = CoreError::Config(ConfigError::Syntax {
        line: 3,
        details: "no section".to_string(),
    });
    assert_eq!(syntax.error_code(), "CONFIG_MALFORMED");

    let invalid_name = CoreError::InvalidName {
        name: " ".to_string(),
        reason: "empty".to_string(),
    };
    assert_eq!(invalid_name.error_code(), "INVALID_NAME");
}

#[test]
fn test_into_source_unavailable() {
    let network = CoreError::RedditApi(RedditApiError::RequestTimeout);
    match network.into_source_unavailable("Reddit API") {
        CoreError::SourceUnavailable {
            source_name,
            reason,
        } => {
            assert_eq!(source_name, "Reddit API");
            assert!(reason.contains("timeout"));
        }
        other => panic!("Expected SourceUnavailable, got {other:?}"),
    }

    let invalid = CoreError::InvalidName {
        name: "".to_string(),
        reason: "empty".to_string(),
    };
    assert!(matches!(
        invalid.into_source_unavailable("Reddit API"),
        CoreError::InvalidName { .. }
    ));
}

#[test]
fn test_expired_wait_becomes_source_unavailable() {
    let expired = CoreError::Timeout {
        after: Duration::from_millis(1500),
    };
    assert_eq!(expired.error_code(), "TIMEOUT");

    match expired.into_source_unavailable("warehouse") {
        CoreError::SourceUnavailable {
            source_name,
            reason,
        } => {
            assert_eq!(source_name, "warehouse");
            assert_eq!(reason, "no answer within 1.5s");
        }
        other => panic!("Expected SourceUnavailable, got {other:?}"),
    }
}

#[test]
fn test_offending_key() {
    let error = ConfigError::Validation {
        section: "reddit_extraction".to_string(),
        key: "limit".to_string(),
        reason: "must be a positive integer or None".to_string(),
    };
    assert_eq!(error.offending_key(), Some(("reddit_extraction", "limit")));

    let error = ConfigError::Missing {
        path: "configuration.conf".to_string(),
    };
    assert_eq!(error.offending_key(), None);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::Validation {
        section: "reddit_config".to_string(),
        key: "client_id".to_string(),
        reason: "must not be empty".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("client_id"));
    assert!(message.contains("Nothing was saved"));

    let unavailable = CoreError::source_unavailable("warehouse", "connection refused");
    assert_eq!(
        unavailable.user_friendly_message(),
        "Could not reach warehouse: connection refused"
    );
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
