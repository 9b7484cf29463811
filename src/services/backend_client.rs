use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientError;
use crate::jobs::live_update::CoinSource;
use crate::models::auth::{
    AckResponse, ErrorResponse, LoginRequest, LoginResponse, Profile, RegisterRequest,
    UpdateProfileRequest, UpdateProfileResponse,
};
use crate::models::coin::{CoinRecord, FavoriteCoin};
use crate::models::favorite::{AddFavoriteRequest, FavoriteStatus};
use crate::models::news::NewsPage;
use crate::services::session_store::SessionStore;

/// Typed wrapper over the backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    session: SessionStore,
    detail_cache: Arc<Cache<String, CoinRecord>>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Result<Self, ClientError> {
        Self::with_settings(base_url, session, Duration::from_secs(10), Duration::from_secs(30))
    }

    pub fn with_settings(
        base_url: impl Into<String>,
        session: SessionStore,
        timeout: Duration,
        detail_cache_ttl: Duration,
    ) -> Result<Self, ClientError> {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(detail_cache_ttl)
            .build();

        let raw = base_url.into();
        let base_url = match Url::parse(raw.trim_end_matches('/')) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => {
                return Err(ClientError::Config {
                    key: "COINWATCH_API_URL".to_string(),
                    value: raw,
                });
            }
        };

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            session,
            detail_cache: Arc::new(cache),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor: the base URL always has a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the bearer token, failing fast when none is stored.
    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Log in and persist the returned token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        tracing::info!("Logging in as {}", email);

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post(self.url(&["auth", "login"])).json(&request).send().await?;
        let status = response.status().as_u16();
        let body: LoginResponse = decode_lenient(response).await?;

        match (body.success, body.token) {
            (true, Some(token)) => {
                self.session.set_token(&token)?;
                Ok(token)
            }
            (_, _) => Err(ClientError::Backend {
                status,
                message: body.error.unwrap_or_else(|| "Login failed".to_string()),
            }),
        }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<(), ClientError> {
        tracing::info!("Registering user {}", username);

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.client.post(self.url(&["auth", "register"])).json(&request).send().await?;
        let status = response.status().as_u16();
        let ack: AckResponse = decode_lenient(response).await?;

        if ack.success == Some(true) {
            Ok(())
        } else {
            Err(ClientError::Backend {
                status,
                message: ack.error.unwrap_or_else(|| "Registration failed".to_string()),
            })
        }
    }

    /// Tell the backend to end the session, then drop the local token. The
    /// token is kept when the backend call fails for any reason other than
    /// rejecting the token itself.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let request = self.authorized(self.client.post(self.url(&["auth", "logout"])))?;
        match expect_success(request.send().await?).await {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Backend rejected the token on logout, clearing session");
                self.session.clear()?;
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        self.session.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub async fn get_profile(&self) -> Result<Profile, ClientError> {
        let request = self.authorized(self.client.get(self.url(&["profile"])))?;
        decode(request.send().await?).await
    }

    /// Update username and email. A re-issued token replaces the stored one.
    pub async fn update_profile(&self, username: &str, email: &str) -> Result<UpdateProfileResponse, ClientError> {
        let body = UpdateProfileRequest {
            username: username.to_string(),
            email: email.to_string(),
        };
        let request = self.authorized(self.client.put(self.url(&["profile"])).json(&body))?;
        let response = request.send().await?;
        let status = response.status().as_u16();
        let ack: UpdateProfileResponse = decode(response).await?;

        // Only an ack carrying `message` counts as an update.
        if ack.error.is_some() || ack.message.is_none() {
            return Err(ClientError::Backend {
                status,
                message: ack.error.unwrap_or_else(|| "Failed to update profile".to_string()),
            });
        }
        if let Some(token) = ack.token.as_deref().filter(|t| !t.is_empty()) {
            self.session.set_token(token)?;
        }

        Ok(ack)
    }

    /// Ask the backend whether the stored token is still accepted, returning
    /// the profile it belongs to. A rejected token is removed from the store.
    pub async fn verify_session(&self) -> Result<Option<Profile>, ClientError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }

        match self.get_profile().await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Stored token rejected by backend, clearing session");
                self.session.clear()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Currency data
    // ------------------------------------------------------------------

    pub async fn get_currency_list(&self) -> Result<Vec<CoinRecord>, ClientError> {
        tracing::debug!("Fetching coin list");

        let response = self.client.get(self.url(&["currency"])).send().await?;
        let coins: Vec<CoinRecord> = decode(response).await?;

        tracing::debug!("Fetched {} coins", coins.len());

        Ok(coins)
    }

    pub async fn get_currency(&self, id: &str) -> Result<CoinRecord, ClientError> {
        if let Some(cached) = self.detail_cache.get(id).await {
            tracing::debug!("Cache hit for coin {}", id);
            return Ok(cached);
        }

        let response = self.client.get(self.url(&["currency", id])).send().await?;
        let coin: CoinRecord = decode(response).await?;

        self.detail_cache.insert(id.to_string(), coin.clone()).await;

        Ok(coin)
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    pub async fn list_favorites(&self) -> Result<Vec<FavoriteCoin>, ClientError> {
        let request = self.authorized(self.client.get(self.url(&["favorites"])))?;
        decode(request.send().await?).await
    }

    pub async fn add_favorite(&self, coin_id: &str) -> Result<(), ClientError> {
        let body = AddFavoriteRequest {
            coin_id: coin_id.to_string(),
        };
        let request = self.authorized(self.client.post(self.url(&["favorites"])).json(&body))?;
        expect_success(request.send().await?).await
    }

    pub async fn favorite_status(&self, coin_id: &str) -> Result<FavoriteStatus, ClientError> {
        let request = self.authorized(self.client.get(self.url(&["favorites", coin_id])))?;
        decode(request.send().await?).await
    }

    pub async fn remove_favorite(&self, coin_id: &str) -> Result<(), ClientError> {
        let request = self.authorized(self.client.delete(self.url(&["favorites", coin_id])))?;
        expect_success(request.send().await?).await
    }

    // ------------------------------------------------------------------
    // News
    // ------------------------------------------------------------------

    /// Zero-based `page` of `size` items.
    pub async fn list_news(&self, page: u32, size: u32) -> Result<NewsPage, ClientError> {
        let response = self
            .client
            .get(self.url(&["news"]))
            .query(&[("page", page.to_string()), ("size", size.to_string())])
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl CoinSource for BackendClient {
    async fn fetch_coins(&self) -> Result<Vec<CoinRecord>, ClientError> {
        self.get_currency_list().await
    }
}

/// Decode a 2xx body as `T`, or turn the response into `ClientError::Backend`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(backend_error(status.as_u16(), body))
    }
}

/// Like `decode`, but also decodes error statuses whose body matches `T`.
/// Auth endpoints answer `{success:false,error}` with 4xx codes.
async fn decode_lenient<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() && body.trim().is_empty() {
        return Ok(serde_json::from_str("{}")?);
    }

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok(value),
        Err(e) if status.is_success() => Err(e.into()),
        Err(_) => Err(backend_error(status.as_u16(), body)),
    }
}

async fn expect_success(response: Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(backend_error(status.as_u16(), body))
}

fn backend_error(status: u16, body: String) -> ClientError {
    let message = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => err.error,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body,
    };
    ClientError::Backend { status, message }
}
