// 🔐 Google credentials - token file, refresh, first-time consent
//
// The rest of the crate only ever calls `get_valid_credential()`:
//   token valid            → use it
//   expired + refresh      → refresh, persist
//   missing / refresh fail → browser consent, persist

pub mod consent;

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 60;

// ============================================================================
// CLIENT SECRETS (credentials.json)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
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
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: Option<ClientSecrets>,
    installed: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load a Google Cloud client secrets file (`web` or `installed` application)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secrets: {:?}", path))?;
        ClientSecrets::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(content).context("Failed to parse client secrets JSON")?;

        file.web
            .or(file.installed)
            .ok_or_else(|| anyhow!("Client secrets have neither a 'web' nor an 'installed' section"))
    }

    /// First registered redirect URI; the loopback listener binds to its port
    pub fn redirect_uri(&self) -> Result<&str> {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Client secrets list no redirect_uris"))
    }

    pub fn redirect_port(&self) -> Result<u16> {
        let uri = self.redirect_uri()?;
        let url = reqwest::Url::parse(uri).with_context(|| format!("Invalid redirect URI: {}", uri))?;
        url.port_or_known_default()
            .ok_or_else(|| anyhow!("Redirect URI has no port: {}", uri))
    }
}

// ============================================================================
// CREDENTIAL (token.json)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// No expiry recorded counts as valid
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().map_or(false, |t| !t.is_empty())
    }
}

/// Raw token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Turn into a credential; refresh responses usually omit the refresh token, keep the old one
    pub fn into_credential(self, previous: Option<&Credential>, now: DateTime<Utc>) -> Credential {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => previous
                .map(|p| p.scopes.clone())
                .unwrap_or_else(|| vec![SPREADSHEETS_SCOPE.to_string()]),
        };

        Credential {
            access_token: self.access_token,
            refresh_token,
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scopes,
        }
    }
}

// ============================================================================
// TOKEN STORE
// ============================================================================

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        TokenStore { path: path.into() }
    }

    /// `Ok(None)` when no token has been saved yet
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file: {:?}", self.path))?;
        let credential = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file: {:?}", self.path))?;

        Ok(Some(credential))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        let content = serde_json::to_string_pretty(credential)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write token file: {:?}", self.path))
    }
}

// ============================================================================
// CREDENTIAL PROVIDER
// ============================================================================

/// What to do with the credential found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialAction {
    Use,
    Refresh,
    Reauthorize,
}

pub fn next_action(stored: Option<&Credential>, now: DateTime<Utc>) -> CredentialAction {
    match stored {
        Some(c) if !c.is_expired(now) => CredentialAction::Use,
        Some(c) if c.can_refresh() => CredentialAction::Refresh,
        _ => CredentialAction::Reauthorize,
    }
}

pub struct CredentialProvider {
    secrets_path: PathBuf,
    store: TokenStore,
    client: reqwest::blocking::Client,
}

impl CredentialProvider {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(secrets_path: P, token_path: Q) -> Self {
        CredentialProvider {
            secrets_path: secrets_path.into(),
            store: TokenStore::new(token_path),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// A credential that is good for the next API call
    pub fn get_valid_credential(&self) -> Result<Credential> {
        // An unreadable token file is handled like a missing one
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("[Auth] Ignoring token file: {:#}", e);
                None
            }
        };

        let credential = match (next_action(stored.as_ref(), Utc::now()), stored) {
            (CredentialAction::Use, Some(credential)) => return Ok(credential),
            (CredentialAction::Refresh, stored) => {
                let secrets = self.secrets()?;
                match self.refresh(&secrets, stored.as_ref()) {
                    Ok(credential) => credential,
                    Err(e) => {
                        log::warn!("[Auth] Refresh failed, asking for consent again: {:#}", e);
                        self.reauthorize(&secrets)?
                    }
                }
            }
            _ => {
                log::info!("[Auth] No usable token, starting consent flow");
                self.reauthorize(&self.secrets()?)?
            }
        };

        self.store.save(&credential)?;
        Ok(credential)
    }

    fn secrets(&self) -> Result<ClientSecrets> {
        ClientSecrets::from_file(&self.secrets_path)
    }

    fn refresh(&self, secrets: &ClientSecrets, stored: Option<&Credential>) -> Result<Credential> {
        let refresh_token = stored
            .and_then(|c| c.refresh_token.as_deref())
            .ok_or_else(|| anyhow!("No refresh token"))?;

        let response = self.token_request(
            &secrets.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
            ],
        )?;

        log::info!("[Auth] Access token refreshed");
        Ok(response.into_credential(stored, Utc::now()))
    }

    fn reauthorize(&self, secrets: &ClientSecrets) -> Result<Credential> {
        let redirect_uri = secrets.redirect_uri()?;
        let port = secrets.redirect_port()?;
        let pkce = Pkce::generate();
        let state = uuid::Uuid::new_v4().simple().to_string();

        let url = authorization_url(secrets, redirect_uri, &state, &pkce);
        println!("\n🔑 Authorize Google Sheets access by visiting:\n\n   {}\n", url);

        let response = capture_redirect(port)?;

        if let Some(error) = response.error {
            bail!("Authorization was denied: {}", error);
        }
        if response.state.as_deref() != Some(state.as_str()) {
            bail!("Authorization redirect carried an unexpected state");
        }
        let code = response
            .code
            .ok_or_else(|| anyhow!("Authorization redirect carried no code"))?;

        let token = self.token_request(
            &secrets.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code_verifier", pkce.verifier.as_str()),
            ],
        )?;

        log::info!("[Auth] Consent granted, token saved");
        Ok(token.into_credential(None, Utc::now()))
    }

    fn token_request(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let resp = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .context("Token request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("Token endpoint HTTP {}: {}", status, body));
        }

        resp.json::<TokenResponse>().context("Failed to parse token response")
    }
}

#[cfg(feature = "consent")]
fn capture_redirect(port: u16) -> Result<consent::AuthorizationResponse> {
    consent::wait_for_redirect(port)
}

#[cfg(not(feature = "consent"))]
fn capture_redirect(_port: u16) -> Result<consent::AuthorizationResponse> {
    bail!("Google consent flow not available. Rebuild with: cargo build --features consent")
}

// ============================================================================
// PKCE + AUTHORIZATION URL
// ============================================================================

/// Proof key for the code exchange (RFC 7636, S256)
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        // 64 hex chars, inside the 43..=128 unreserved-character range
        let verifier = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        Pkce::from_verifier(verifier)
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Pkce { verifier, challenge }
    }
}

pub fn authorization_url(secrets: &ClientSecrets, redirect_uri: &str, state: &str, pkce: &Pkce) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", secrets.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("scope", SPREADSHEETS_SCOPE),
        ("state", state),
        ("code_challenge", pkce.challenge.as_str()),
        ("code_challenge_method", "S256"),
        ("access_type", "offline"),
        ("prompt", "consent"),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", secrets.auth_uri, query)
}

// ============================================================================
// TESTS
// ============================================================================
