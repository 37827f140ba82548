//! Google OAuth 2.0 authorization-code flow.
//!
//! [`OAuthProvider`] is the seam the HTTP layer talks to; [`GoogleOAuth`] is the
//! production implementation built on the `oauth2` crate. The authorization URL
//! is bound to a caller-supplied `state`, the callback exchanges the returned
//! `code` for an access token, and the token is used once to read the profile
//! from Google's userinfo endpoint.

use anyhow::Context;
use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GoogleConfig;

pub const GOOGLE_PROVIDER: &str = "google";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("oauth code exchange failed: {0}")]
    Exchange(String),
    #[error("failed to fetch user info: {0}")]
    Profile(String),
    #[error("email {0} is not verified by the provider")]
    UnverifiedEmail(String),
}

/// Identity reported by the provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider_id: String,
    pub email: String,
    pub email_verified: bool,
    pub name: String,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Value stored in `users.provider` for accounts created through this provider.
    fn provider(&self) -> &'static str;
    fn authorize_url(&self, state: &str) -> String;
    /// Returns the access token for `code`.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;
    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, OAuthError>;
}

/// Google user info from the v2 userinfo API.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: String,
    #[serde(default)]
    verified_email: bool,
    #[serde(default)]
    name: String,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
        }
    }
}

pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        Self::with_endpoints(cfg, GoogleEndpoints::default())
    }

    pub fn with_endpoints(cfg: &GoogleConfig, endpoints: GoogleEndpoints) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(cfg.client_id.clone()))
            .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(endpoints.auth_url).context("google auth url")?)
            .set_token_uri(TokenUrl::new(endpoints.token_url).context("google token url")?)
            .set_redirect_uri(
                RedirectUrl::new(cfg.redirect_url.clone()).context("google redirect url")?,
            );

        // Following redirects during the token exchange would leak the code.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build oauth http client")?;

        Ok(Self {
            client,
            http,
            userinfo_url: endpoints.userinfo_url,
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn provider(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    fn authorize_url(&self, state: &str) -> String {
        let (url, _) = self
            .client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                warn!(error = %e, "google token exchange failed");
                OAuthError::Exchange(e.to_string())
            })?;
        debug!("google token exchanged");
        Ok(token.access_token().secret().clone())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, OAuthError> {
        let resp = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Profile(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OAuthError::Profile(format!("google api returned status {status}")));
        }

        let user: GoogleUser = resp
            .json()
            .await
            .map_err(|e| OAuthError::Profile(format!("decode google user info: {e}")))?;

        Ok(OAuthProfile {
            provider_id: user.id,
            email: user.email,
            email_verified: user.verified_email,
            name: user.name,
        })
    }
}
