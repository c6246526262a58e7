use crate::auth::{fetch_app_token, AppCredentials, AppToken, REDDIT_TOKEN_URL};
use async_trait::async_trait;
use redditlens_core::{ConnectionProbe, CoreError, HealthTarget, RedditApiError, SubredditInfo};
use reqwest::{redirect, Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// `reason` values Reddit sends with a 403 for a subreddit that exists but is closed.
const RESTRICTED_REASONS: [&str; 3] = ["private", "quarantined", "gold_only"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditSubredditData {
    pub display_name: String,
    pub title: Option<String>,
    pub public_description: Option<String>,
    pub subscribers: Option<u64>,
    pub over18: Option<bool>,
    pub url: Option<String>,
    pub created_utc: Option<f64>,
    pub subreddit_type: Option<String>,
}

/// What Reddit said about a subreddit name.
#[derive(Debug, Clone, PartialEq)]
pub enum SubredditLookup {
    Found(RedditSubredditData),
    /// Exists, but the app may not read it (private, quarantined).
    Restricted,
    NotFound,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    credentials: AppCredentials,
    api_base: String,
    token_url: String,
}

impl RedditApiClient {
    pub fn new(credentials: AppCredentials, timeout: Duration) -> Result<Self, CoreError> {
        // Unknown subreddits answer with a redirect to the search page.
        let http_client = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http_client,
            credentials,
            api_base: REDDIT_API_BASE.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
        })
    }

    /// Points the client at other hosts, e.g. a proxy.
    pub fn with_endpoints(mut self, api_base: &str, token_url: &str) -> Result<Self, CoreError> {
        for candidate in [api_base, token_url] {
            Url::parse(candidate).map_err(|e| CoreError::Internal {
                message: format!("Invalid Reddit endpoint '{}': {}", candidate, e),
            })?;
        }
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.token_url = token_url.to_string();
        Ok(self)
    }

    pub fn user_agent(&self) -> &str {
        &self.credentials.user_agent
    }

    async fn access_token(&self) -> Result<AppToken, CoreError> {
        fetch_app_token(&self.http_client, &self.credentials, &self.token_url).await
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);
        let start_time = Instant::now();

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        debug!(
            "{} {} answered {} in {:?}",
            method,
            endpoint,
            status,
            start_time.elapsed()
        );

        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let resource = endpoint.to_string();
        let err = if status.is_redirection() || code == 404 {
            RedditApiError::NotFound { resource }
        } else if code == 403 {
            let reason = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("reason")?.as_str().map(str::to_string));
            RedditApiError::Forbidden { resource, reason }
        } else if code == 401 {
            RedditApiError::InvalidToken
        } else if code == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        } else if status.is_server_error() {
            RedditApiError::ServerError { status_code: code }
        } else {
            RedditApiError::UnexpectedStatus {
                endpoint: resource,
                status_code: code,
            }
        };

        match err {
            RedditApiError::NotFound { .. } | RedditApiError::Forbidden { .. } => {
                debug!("Request for {} answered {}", endpoint, status)
            }
            _ => error!("Request failed with status: {} for {}", status, endpoint),
        }
        Err(CoreError::RedditApi(err))
    }

    pub async fn get_subreddit_about(&self, subreddit: &str) -> Result<SubredditLookup, CoreError> {
        let token = self.access_token().await?;
        let endpoint = format!("/r/{}/about", subreddit);

        let response = match self
            .make_request(Method::GET, &endpoint, &token.access_token)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let lookup = classify_about_error(e)?;
                info!("r/{} lookup answered {:?}", subreddit, lookup);
                return Ok(lookup);
            }
        };

        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit info: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse info for r/{}", subreddit),
            })
        })?;

        parse_about(body)
    }

    /// Cheapest authenticated call: lists OAuth scopes.
    pub async fn get_scopes(&self) -> Result<serde_json::Value, CoreError> {
        let token = self.access_token().await?;
        let response = self
            .make_request(Method::GET, "/api/v1/scopes", &token.access_token)
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse scopes: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse scopes".to_string(),
            })
        })
    }
}

/// Turns a failed `/about` request into an answer where the failure is one.
/// A 403 only means "exists but closed" when Reddit says why; any other 403
/// (e.g. a blocked user agent) stays an error.
pub fn classify_about_error(error: CoreError) -> Result<SubredditLookup, CoreError> {
    match error {
        CoreError::RedditApi(RedditApiError::NotFound { .. }) => Ok(SubredditLookup::NotFound),
        CoreError::RedditApi(RedditApiError::Forbidden {
            reason: Some(ref reason),
            ..
        }) if RESTRICTED_REASONS.contains(&reason.as_str()) => Ok(SubredditLookup::Restricted),
        other => Err(other),
    }
}

/// Decodes an `/about` payload. Anything but a `t5` thing (e.g. a search
/// listing) means the name did not resolve to a subreddit.
pub fn parse_about(body: serde_json::Value) -> Result<SubredditLookup, CoreError> {
    if body.get("kind").and_then(|kind| kind.as_str()) != Some("t5") {
        return Ok(SubredditLookup::NotFound);
    }

    let child: RedditListingChild<RedditSubredditData> =
        serde_json::from_value(body).map_err(|e| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unexpected subreddit payload: {}", e),
            })
        })?;
    Ok(SubredditLookup::Found(child.data))
}

#[async_trait]
impl ConnectionProbe for RedditApiClient {
    fn target(&self) -> HealthTarget {
        HealthTarget::RedditApi
    }

    async fn ping(&self) -> Result<String, CoreError> {
        self.get_scopes().await?;
        Ok(format!(
            "Authenticated as application {}",
            self.credentials.client_id
        ))
    }
}

impl From<RedditSubredditData> for SubredditInfo {
    fn from(data: RedditSubredditData) -> Self {
        Self {
            url: Some(format!("https://reddit.com/r/{}", data.display_name)),
            exists: true,
            restricted: false,
            subscriber_count: data.subscribers,
            title: data.title.filter(|title| !title.is_empty()),
            description: data
                .public_description
                .filter(|description| !description.is_empty()),
            over18: data.over18.unwrap_or(false),
            name: data.display_name,
        }
    }
}
