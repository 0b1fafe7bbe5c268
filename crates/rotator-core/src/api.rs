//! Client for the remote avatar REST API.
//!
//! One client holds one session cookie. Every request goes through
//! [`AvatarClient::send`], which performs the anti-forgery (CSRF) dance: when the
//! service answers `403` with a fresh `x-csrf-token` header, the token is cached
//! and the request is retried exactly once.

use crate::error::ApiError;
use crate::types::{
    Asset, AuthenticatedUser, AvatarType, BodyColors, OutfitDetails, OutfitPage, OutfitRef,
};
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const SESSION_COOKIE: &str = ".ROBLOSECURITY";
pub const CSRF_HEADER: &str = "x-csrf-token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const OUTFITS_PER_PAGE: u32 = 50;
const ERROR_BODY_PREVIEW: usize = 100;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Base URLs of the two services the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub users: String,
    pub avatar: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            users: "https://users.roblox.com".to_string(),
            avatar: "https://avatar.roblox.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point both services at one base URL (used against local mock servers).
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            users: base.clone(),
            avatar: base,
        }
    }
}

// ---------------------------------------------------------------------------
// AvatarApi
// ---------------------------------------------------------------------------

/// The operations the rotation engine and the control server need.
pub trait AvatarApi: Clone + Send + Sync + 'static {
    /// Replace the session cookie. Drops any cached user id and CSRF token.
    fn set_cookie(&self, cookie: &str);

    fn authenticated_user(&self)
        -> impl Future<Output = Result<AuthenticatedUser, ApiError>> + Send;

    fn list_outfits(&self) -> impl Future<Output = Result<Vec<OutfitRef>, ApiError>> + Send;

    fn outfit_details(
        &self,
        outfit_id: u64,
    ) -> impl Future<Output = Result<OutfitDetails, ApiError>> + Send;

    fn set_avatar_type(
        &self,
        avatar_type: AvatarType,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn set_body_colors(
        &self,
        colors: &BodyColors,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn set_wearing_assets(
        &self,
        assets: &[Asset],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

// ---------------------------------------------------------------------------
// AvatarClient
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Session {
    cookie: String,
    csrf_token: Option<String>,
    user_id: Option<u64>,
}

/// reqwest-backed [`AvatarApi`]. Clones share the session.
#[derive(Debug, Clone)]
pub struct AvatarClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    session: Arc<Mutex<Session>>,
}

impl AvatarClient {
    pub fn new(endpoints: Endpoints, cookie: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("avatar-rotator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            session: Arc::new(Mutex::new(Session {
                cookie: cookie.to_string(),
                ..Default::default()
            })),
        })
    }

    pub fn user_id(&self) -> Option<u64> {
        self.session().user_id
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.session().csrf_token.clone()
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Send one request, refreshing the CSRF token and retrying once on a
    /// `403` that carries a new token. Non-2xx responses become
    /// [`ApiError::Status`] and are logged.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self.send_once(method.clone(), url, body).await?;

        if response.status() == StatusCode::FORBIDDEN {
            let fresh = response
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            if let Some(token) = fresh {
                warn!("CSRF token expired, refreshing");
                self.session().csrf_token = Some(token);
                let retried = self.send_once(method, url, body).await?;
                return check_status(retried, url).await;
            }
        }

        check_status(response, url).await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let (cookie, token) = {
            let session = self.session();
            (session.cookie.clone(), session.csrf_token.clone())
        };

        let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={cookie}")).map_err(|_| {
            warn!("cookie contains characters that cannot be sent in a header");
            ApiError::NotAuthenticated
        })?;
        let mut request = self.http.request(method, url).header(COOKIE, cookie);
        if let Some(token) = token {
            request = request.header(CSRF_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(url, "avatar api request");
        Ok(request.send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, url, None).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<(), ApiError> {
        self.send(Method::POST, url, Some(&body)).await?;
        Ok(())
    }
}

/// 200 and 201 pass; anything else is logged with a body preview and returned as an error.
async fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status == StatusCode::OK || status == StatusCode::CREATED {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
    error!(status = status.as_u16(), url, body = %body, "Request failed");
    Err(ApiError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}

impl AvatarApi for AvatarClient {
    fn set_cookie(&self, cookie: &str) {
        let mut session = self.session();
        session.cookie = cookie.to_string();
        session.csrf_token = None;
        session.user_id = None;
    }

    async fn authenticated_user(&self) -> Result<AuthenticatedUser, ApiError> {
        if self.session().cookie.trim().is_empty() {
            return Err(ApiError::NotAuthenticated);
        }
        let url = format!("{}/v1/users/authenticated", self.endpoints.users);
        let user: AuthenticatedUser = self.get_json(&url).await.inspect_err(|e| {
            error!(error = %e, "Auth check failed");
        })?;
        self.session().user_id = Some(user.id);
        Ok(user)
    }

    async fn list_outfits(&self) -> Result<Vec<OutfitRef>, ApiError> {
        let user_id = match self.user_id() {
            Some(id) => id,
            None => self.authenticated_user().await?.id,
        };
        let url = format!(
            "{}/v2/avatar/users/{user_id}/outfits?page=1&itemsPerPage={OUTFITS_PER_PAGE}&isEditable=true",
            self.endpoints.avatar
        );
        let page: OutfitPage = self.get_json(&url).await?;
        Ok(page
            .data
            .into_iter()
            .filter(|o| o.outfit_type.as_deref() == Some("Avatar"))
            .map(|o| OutfitRef::new(o.id, o.name))
            .collect())
    }

    async fn outfit_details(&self, outfit_id: u64) -> Result<OutfitDetails, ApiError> {
        let url = format!("{}/v3/outfits/{outfit_id}/details", self.endpoints.avatar);
        self.get_json(&url).await
    }

    async fn set_avatar_type(&self, avatar_type: AvatarType) -> Result<(), ApiError> {
        let url = format!(
            "{}/v1/avatar/set-player-avatar-type",
            self.endpoints.avatar
        );
        self.post(
            &url,
            serde_json::json!({ "playerAvatarType": avatar_type.wire_value() }),
        )
        .await?;
        info!(avatar_type = %avatar_type, "Set avatar type");
        Ok(())
    }

    async fn set_body_colors(&self, colors: &BodyColors) -> Result<(), ApiError> {
        let url = format!("{}/v2/avatar/set-body-colors", self.endpoints.avatar);
        let body = serde_json::to_value(colors).map_err(|source| ApiError::Decode {
            url: url.clone(),
            source,
        })?;
        self.post(&url, body).await?;
        info!("Set body colors");
        Ok(())
    }

    async fn set_wearing_assets(&self, assets: &[Asset]) -> Result<(), ApiError> {
        let url = format!("{}/v2/avatar/set-wearing-assets", self.endpoints.avatar);
        let body = serde_json::json!({ "assets": assets });
        self.post(&url, body).await?;
        info!(count = assets.len(), "Equipped assets");
        Ok(())
    }
}
