//! Blocking HTTP client for the GARDENA smart system API.
//!
//! - Uses `ureq` (no async); status codes are inspected, not raised.
//! - Authenticates with the OAuth2 client-credentials grant against the
//!   Husqvarna authentication API and refreshes the token before it expires.
//! - Covers the endpoints the tool layer needs: list locations, fetch one
//!   location with its services, send a command to a service.

use crate::config::Config;
use crate::models::gardena::{LocationResponse, LocationsResponse};
use crate::services::commands::CommandPayload;
use http::StatusCode;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const API_MEDIA_TYPE: &str = "application/vnd.api+json";
/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);
/// Longest lifetime honoured for an issued token, whatever `expires_in` says.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
pub enum GardenaClientError {
    Transport(String),
    Http { status: u16, message: String },
    Decode(serde_path_to_error::Error<serde_json::Error>),
    Auth(String),
}

impl core::fmt::Display for GardenaClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GardenaClientError::Transport(s) => write!(f, "transport error: {}", s),
            GardenaClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            GardenaClientError::Decode(e) => write!(f, "json error at {}: {}", e.path(), e.inner()),
            GardenaClientError::Auth(e) => write!(f, "auth error: {}", e),
        }
    }
}

impl std::error::Error for GardenaClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GardenaClientError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for GardenaClientError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        GardenaClientError::Decode(value)
    }
}

impl From<ureq::Error> for GardenaClientError {
    fn from(value: ureq::Error) -> Self {
        GardenaClientError::Transport(value.to_string())
    }
}

/// Operations the tool layer needs from the upstream API.
pub trait SmartSystem: Send + Sync {
    fn get_locations(&self) -> Result<LocationsResponse, GardenaClientError>;

    fn get_location(&self, location_id: &str) -> Result<LocationResponse, GardenaClientError>;

    fn send_command(&self, service_id: &str, payload: &CommandPayload) -> Result<(), GardenaClientError>;
}

#[derive(Debug, Clone)]
struct OAuthToken {
    access_token: String,
    expires_at: Instant,
    refresh_token: Option<String>,
}

impl OAuthToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now.checked_add(EXPIRY_MARGIN).is_some_and(|t| t < self.expires_at)
    }
}

fn token_expiry(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME);
    now.checked_add(lifetime).unwrap_or(now)
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct GardenaClient {
    agent: ureq::Agent,
    client_id: String,
    client_secret: String,
    auth_base_url: String,
    api_base_url: String,
    token: Mutex<Option<OAuthToken>>,
}

type Response = http::Response<ureq::Body>;

impl GardenaClient {
    /// Build the client. No request is made until the first API call.
    pub fn new(cfg: &Config) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(cfg.http_timeout))
            .build()
            .into();

        GardenaClient {
            agent,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            auth_base_url: cfg.auth_base_url.trim_end_matches('/').to_string(),
            api_base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }

    fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.auth_base_url)
    }

    fn client_credentials_grant(&self) -> Result<OAuthToken, GardenaClientError> {
        debug!("Requesting access token via client credentials");
        let resp = self
            .agent
            .post(&self.token_url())
            .header("Accept", "application/json")
            .send_form([
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ]);
        Self::parse_token_response(resp)
    }

    fn refresh_grant(&self, refresh: &str) -> Result<OAuthToken, GardenaClientError> {
        debug!("Refreshing access token");
        let resp = self
            .agent
            .post(&self.token_url())
            .header("Accept", "application/json")
            .send_form([
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh),
            ]);
        Self::parse_token_response(resp)
    }

    fn parse_token_response(resp: Result<Response, ureq::Error>) -> Result<OAuthToken, GardenaClientError> {
        let mut resp = resp.map_err(|e| GardenaClientError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp.body_mut().read_to_string()?;
        if !status.is_success() {
            return Err(GardenaClientError::Auth(format!(
                "Authentication failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }
        let TokenResponse {
            access_token,
            expires_in,
            refresh_token,
        } = decode(&body)?;
        Ok(OAuthToken {
            access_token,
            expires_at: token_expiry(Instant::now(), expires_in),
            refresh_token,
        })
    }

    /// Acquire a new token, preferring the refresh grant when one is available.
    fn renew(&self, previous: Option<&OAuthToken>) -> Result<OAuthToken, GardenaClientError> {
        match previous.and_then(|t| t.refresh_token.as_deref()) {
            Some(refresh) => self.refresh_grant(refresh).or_else(|e| {
                warn!("Token refresh failed ({}); falling back to client credentials", e);
                self.client_credentials_grant()
            }),
            None => self.client_credentials_grant(),
        }
    }

    fn token_slot(&self) -> MutexGuard<'_, Option<OAuthToken>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bearer(&self) -> Result<String, GardenaClientError> {
        let mut slot = self.token_slot();
        if let Some(token) = slot.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.access_token.clone());
        }
        let token = self.renew(slot.as_ref())?;
        info!("Authenticated to GARDENA API");
        let access = token.access_token.clone();
        *slot = Some(token);
        Ok(access)
    }

    /// Issue an authenticated request; a 401 forces one re-authentication and a second attempt.
    fn authorized<F>(&self, send: F) -> Result<Response, GardenaClientError>
    where
        F: Fn(&str) -> Result<Response, ureq::Error>,
    {
        let token = self.bearer()?;
        let resp = send(format!("Bearer {}", token).as_str())?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        warn!("API rejected access token; re-authenticating");
        {
            let mut slot = self.token_slot();
            let renewed = self.renew(slot.as_ref())?;
            *slot = Some(renewed);
        }
        let token = self.bearer()?;
        Ok(send(format!("Bearer {}", token).as_str())?)
    }

    fn read_body(mut resp: Response) -> Result<String, GardenaClientError> {
        let status = resp.status();
        let body = resp.body_mut().read_to_string()?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(GardenaClientError::Http {
                status: status.as_u16(),
                message: body,
            })
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GardenaClientError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self.authorized(|auth| {
            self.agent
                .get(&url)
                .header("Accept", API_MEDIA_TYPE)
                .header("Authorization", auth)
                .header("X-Api-Key", self.client_id.as_str())
                .call()
        })?;
        let body = Self::read_body(resp)?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GardenaClientError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    Ok(serde_path_to_error::deserialize(de)?)
}

/// Random id for the command request envelope.
fn request_id() -> String {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}

impl SmartSystem for GardenaClient {
    fn get_locations(&self) -> Result<LocationsResponse, GardenaClientError> {
        self.get_json("/locations")
    }

    fn get_location(&self, location_id: &str) -> Result<LocationResponse, GardenaClientError> {
        self.get_json(&format!("/locations/{}", location_id))
    }

    fn send_command(&self, service_id: &str, payload: &CommandPayload) -> Result<(), GardenaClientError> {
        let url = self.url(&format!("/command/{}", service_id));
        let body = serde_json::to_string(&payload.clone().into_request(request_id()))
            .map_err(|e| GardenaClientError::Transport(format!("encode command: {}", e)))?;
        info!("PUT {} ({} {:?})", url, payload.command, payload.seconds);
        let resp = self.authorized(|auth| {
            self.agent
                .put(&url)
                .header("Content-Type", API_MEDIA_TYPE)
                .header("Accept", API_MEDIA_TYPE)
                .header("Authorization", auth)
                .header("X-Api-Key", self.client_id.as_str())
                .send(body.as_str())
        })?;
        Self::read_body(resp).map(|_| ())
    }
}
