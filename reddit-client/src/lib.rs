pub mod api;
pub mod auth;
pub mod validator;

#[cfg(test)]
mod tests;

pub use api::{RedditApiClient, RedditSubredditData, SubredditLookup};
pub use auth::AppCredentials;
pub use validator::{normalize_subreddit_name, SubredditSource, SubredditValidator};
