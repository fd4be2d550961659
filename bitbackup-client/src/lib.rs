//! Bitbackup HTTP Clients
//!
//! Typed clients for the two remote services a backup run talks to:
//!
//! - [`BitbucketClient`]: lists a user's or team's repositories and resolves
//!   credential-bearing clone URLs
//! - [`S3Client`]: uploads objects to an S3-compatible store using AWS
//!   Signature Version 4
//!
//! # Example
//!
//! ```no_run
//! use bitbackup_client::BitbucketClient;
//!
//! # async fn example() -> bitbackup_client::Result<()> {
//! let client = BitbucketClient::new("https://api.bitbucket.org/2.0/", "acme", "app-password");
//! for repo in client.list_repositories().await? {
//!     println!("{}", repo.full_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
mod repositories;
pub mod s3;
pub mod signing;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use s3::S3Client;
pub use signing::Credentials;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;

/// Default Bitbucket Cloud API endpoint
pub const DEFAULT_BITBUCKET_ENDPOINT: &str = "https://api.bitbucket.org/2.0/";

/// HTTP client for the Bitbucket Cloud REST API
///
/// Every request is authenticated with HTTP basic auth using the configured
/// username and password (or app password). The same password is embedded
/// into HTTPS clone URLs.
#[derive(Clone)]
pub struct BitbucketClient {
    /// API root, always ending in `/`
    endpoint: String,
    username: String,
    password: String,
    /// HTTP client instance
    client: Client,
}

impl BitbucketClient {
    /// Create a new Bitbucket client
    ///
    /// # Arguments
    /// * `endpoint` - API root (e.g., "https://api.bitbucket.org/2.0/")
    /// * `username` - User or team name, also used as the listing owner
    /// * `password` - Password or app password
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_client(endpoint, username, password, Client::new())
    }

    /// Create a new Bitbucket client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client: Client,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: format!("{}/", endpoint.trim_end_matches('/')),
            username: username.into(),
            password: password.into(),
            client,
        }
    }

    /// Get the API root of this client
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Issue an authenticated GET and deserialize the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let response = ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Turn a non-2xx response into an [`ClientError::ApiError`] carrying the body
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}
