//! OAuth2 installed-application flow against Google's token endpoint
//!
//! A persisted token is reused while valid, refreshed when expired, and the
//! interactive authorization-code exchange only runs when nothing usable is
//! stored.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::infrastructure::google::read_json;
use crate::infrastructure::traits::{CodePrompt, CredentialStore, TokenEndpoint};
use crate::infrastructure::{InfraError, InfraResult};

/// Read and write access to tasks.
pub const TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";

/// Read-only access to tasks.
pub const TASKS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/tasks.readonly";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_TOKENINFO_URI: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";
const STATE: &str = "state-token";

/// Tokens expiring within this window are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// OAuth client registration, as downloaded from the Google Cloud console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The file wraps the registration in an `installed` or `web` section.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parse client secret JSON. `path` is only used for error messages.
    pub fn from_json(content: &str, path: &Path) -> InfraResult<Self> {
        let file: ClientSecretFile =
            serde_json::from_str(content).map_err(|e| InfraError::ClientSecret {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        file.installed
            .or(file.web)
            .ok_or_else(|| InfraError::ClientSecret {
                path: path.to_path_buf(),
                message: "expected an 'installed' or 'web' section".to_string(),
            })
    }

    /// Read client secret JSON from disk.
    pub fn from_file(path: &Path) -> InfraResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InfraError::ClientSecret {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content, path)
    }

    /// Redirect URI sent with the authorization request.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }
}

/// Access token plus what is needed to renew it.
///
/// Serialized field names match the token files written by Go's `oauth2` package,
/// so existing `token.json` files load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Space separated scopes granted by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// A token without expiry is considered valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .map(|expiry| expiry - Duration::seconds(EXPIRY_LEEWAY_SECS) <= now)
            .unwrap_or(false)
    }
}

/// Whether the space separated `granted` list contains `scope`; `None` counts as granted.
pub fn scope_granted(granted: Option<&str>, scope: &str) -> bool {
    granted.map_or(true, |g| g.split_whitespace().any(|s| s == scope))
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a token, keeping `previous_refresh` if the server sent none.
    pub fn into_token(self, previous_refresh: Option<String>, now: DateTime<Utc>) -> Token {
        Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scope: self.scope,
        }
    }
}

/// Token info endpoint response; only the granted scope is of interest.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    scope: Option<String>,
}

/// Google's OAuth endpoints over ureq.
pub struct GoogleTokenEndpoint {
    agent: ureq::Agent,
    tokeninfo_uri: String,
}

impl GoogleTokenEndpoint {
    pub fn new(agent: ureq::Agent) -> Self {
        Self {
            agent,
            tokeninfo_uri: DEFAULT_TOKENINFO_URI.to_string(),
        }
    }
}

impl TokenEndpoint for GoogleTokenEndpoint {
    fn exchange_code(&self, secret: &ClientSecret, code: &str) -> InfraResult<TokenResponse> {
        read_json(self.agent.post(&secret.token_uri).send_form(&[
            ("code", code),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("redirect_uri", secret.redirect_uri()),
            ("grant_type", "authorization_code"),
        ]))
        .map_err(|e| InfraError::auth(format!("unable to retrieve token: {e}")))
    }

    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> InfraResult<TokenResponse> {
        read_json(self.agent.post(&secret.token_uri).send_form(&[
            ("refresh_token", refresh_token),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ]))
        .map_err(|e| InfraError::auth(format!("unable to refresh token: {e}")))
    }

    fn granted_scope(&self, access_token: &str) -> InfraResult<Option<String>> {
        let info: TokenInfo = read_json(
            self.agent
                .get(&self.tokeninfo_uri)
                .query("access_token", access_token)
                .call(),
        )
        .map_err(|e| InfraError::auth(format!("unable to look up token info: {e}")))?;
        Ok(info.scope)
    }
}

/// Obtains a usable access token.
pub struct Authenticator {
    secret: ClientSecret,
    scope: String,
    store: Arc<dyn CredentialStore>,
    prompt: Arc<dyn CodePrompt>,
    endpoint: Arc<dyn TokenEndpoint>,
}

impl Authenticator {
    pub fn new(
        secret: ClientSecret,
        scope: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        prompt: Arc<dyn CodePrompt>,
        endpoint: Arc<dyn TokenEndpoint>,
    ) -> Self {
        Self {
            secret,
            scope: scope.into(),
            store,
            prompt,
            endpoint,
        }
    }

    /// URL the user opens to grant access (offline, so a refresh token is issued).
    pub fn authorization_url(&self) -> InfraResult<Url> {
        Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("access_type", "offline"),
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", self.secret.redirect_uri()),
                ("response_type", "code"),
                ("scope", self.scope.as_str()),
                ("state", STATE),
            ],
        )
        .map_err(|e| InfraError::auth(format!("invalid auth_uri '{}': {e}", self.secret.auth_uri)))
    }

    /// Return a valid token, refreshing or running the interactive flow as needed.
    ///
    /// The returned token carries its granted scope whenever the server can
    /// tell it; see [`Authenticator::with_known_scope`].
    pub fn authorize(&self) -> InfraResult<Token> {
        let now = Utc::now();
        let token = match self.store.load()? {
            Some(token) if !token.is_expired(now) => {
                debug!("authorize: using stored token");
                token
            }
            Some(token) if token.refresh_token.is_some() => {
                debug!("authorize: stored token expired, refreshing");
                let refreshed = self.refresh(&token)?;
                self.store.save(&refreshed)?;
                refreshed
            }
            _ => {
                let token = self.authorize_interactively()?;
                eprintln!("Saving credential file to: {}", self.store.location());
                self.store.save(&token)?;
                token
            }
        };
        self.with_known_scope(token)
    }

    /// Fill in the scope of tokens persisted without one (e.g. by Go's `oauth2`).
    ///
    /// Asks the token info endpoint first, then falls back to a refresh, whose
    /// response lists the scope. The discovered scope is persisted. If neither
    /// works the scope stays unknown.
    pub fn with_known_scope(&self, token: Token) -> InfraResult<Token> {
        if token.scope.is_some() {
            return Ok(token);
        }

        match self.endpoint.granted_scope(&token.access_token) {
            Ok(Some(scope)) => {
                debug!("token info reports scope: {}", scope);
                let token = Token {
                    scope: Some(scope),
                    ..token
                };
                self.store.save(&token)?;
                return Ok(token);
            }
            Ok(None) => warn!("token info did not report a scope"),
            Err(e) => warn!("{}", e),
        }

        if token.refresh_token.is_some() {
            match self.refresh(&token) {
                Ok(refreshed) if refreshed.scope.is_some() => {
                    debug!("refresh reports scope: {:?}", refreshed.scope);
                    self.store.save(&refreshed)?;
                    return Ok(refreshed);
                }
                Ok(_) => warn!("refresh response did not report a scope"),
                Err(e) => warn!("{}", e),
            }
        }

        warn!("granted scope is unknown; write access cannot be checked in advance");
        Ok(token)
    }

    fn authorize_interactively(&self) -> InfraResult<Token> {
        let url = self.authorization_url()?;
        let code = self
            .prompt
            .authorization_code(url.as_str())
            .map_err(|e| InfraError::auth(format!("unable to read authorization code: {e}")))?;
        info!("exchanging authorization code");
        let response = self.endpoint.exchange_code(&self.secret, &code)?;
        Ok(response.into_token(None, Utc::now()))
    }

    fn refresh(&self, token: &Token) -> InfraResult<Token> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| InfraError::auth("token has no refresh token"))?;
        let response = self.endpoint.refresh(&self.secret, refresh_token)?;

        let mut refreshed = response.into_token(token.refresh_token.clone(), Utc::now());
        // Refresh responses may omit the scope; the grant itself is unchanged.
        if refreshed.scope.is_none() {
            refreshed.scope = token.scope.clone();
        }
        Ok(refreshed)
    }
}
