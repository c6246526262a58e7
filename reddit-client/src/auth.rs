//! Application-only OAuth2 (client credentials grant) for read access.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError, TokenResponse,
    TokenUrl,
};
use redditlens_core::{CoreError, RedditApiError};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Credentials from the `[reddit_config]` section.
#[derive(Clone)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl AppCredentials {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

pub struct AppToken {
    pub access_token: String,
    pub expires_in: Option<Duration>,
}

impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

pub fn build_oauth_client(
    credentials: &AppCredentials,
    token_url: &str,
) -> Result<BasicClient, CoreError> {
    if credentials.client_id.trim().is_empty() || credentials.client_secret.trim().is_empty() {
        return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
            reason: "client_id and secret must both be set".to_string(),
        }));
    }

    let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
        message: format!("Invalid auth URL: {}", e),
    })?;
    let token_url = TokenUrl::new(token_url.to_string()).map_err(|e| CoreError::Internal {
        message: format!("Invalid token URL: {}", e),
    })?;

    Ok(BasicClient::new(
        ClientId::new(credentials.client_id.clone()),
        Some(ClientSecret::new(credentials.client_secret.clone())),
        auth_url,
        Some(token_url),
    ))
}

/// Exchanges the app credentials for a bearer token.
pub async fn fetch_app_token(
    http_client: &Client,
    credentials: &AppCredentials,
    token_url: &str,
) -> Result<AppToken, CoreError> {
    let oauth_client = build_oauth_client(credentials, token_url)?;

    debug!("Requesting application token from {}", token_url);
    let token = oauth_client
        .exchange_client_credentials()
        .request_async(|request| send_token_request(http_client, request))
        .await
        .map_err(|e| {
            let mapped = match e {
                RequestTokenError::Request(err) if err.is_timeout() => {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                }
                RequestTokenError::Request(err) => CoreError::Network(err),
                RequestTokenError::ServerResponse(response) => {
                    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                        reason: response.to_string(),
                    })
                }
                RequestTokenError::Parse(err, _) => {
                    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                        reason: format!("token endpoint rejected the credentials ({})", err),
                    })
                }
                RequestTokenError::Other(reason) => {
                    CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
                }
            };
            error!("Token request failed: {}", mapped);
            mapped
        })?;

    Ok(AppToken {
        access_token: token.access_token().secret().clone(),
        expires_in: token.expires_in(),
    })
}

/// Runs the token request through our own client so Reddit sees our user agent.
async fn send_token_request(
    http_client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
