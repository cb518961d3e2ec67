use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;

/// Account data the identity provider vouches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub photo_url: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("token header has no key id")]
    MissingKeyId,
    #[error("no signing key with id {0}")]
    UnknownKey(String),
    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token has no subject")]
    MissingSubject,
}

/// Verifies bearer tokens and resolves them to a provider account
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, AuthError>;
}

/// ID token claims used to build a `ProviderUser`
#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<FirebaseClaims> for ProviderUser {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email.filter(|e| !e.is_empty()),
            email_verified: claims.email_verified.unwrap_or(false),
            photo_url: claims.picture.filter(|p| !p.is_empty()),
            display_name: claims.name.filter(|n| !n.is_empty()),
        }
    }
}

/// Minimum spacing between key fetches forced by an unknown `kid`
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Firebase Authentication ID token verifier.
///
/// Signing keys come from Google's securetoken JWK set and are cached for
/// `jwks_cache_secs`. An unknown `kid` forces a refresh before failing, at
/// most once per `MIN_REFRESH_INTERVAL`.
pub struct FirebaseAuth {
    project_id: String,
    jwks_url: String,
    cache_ttl: Duration,
    min_refresh: Duration,
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
    /// Time of the last fetch attempt; also serializes fetches
    last_attempt: Mutex<Option<Instant>>,
}

impl FirebaseAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            jwks_url: config.jwks_url.clone(),
            cache_ttl: Duration::from_secs(config.jwks_cache_secs),
            min_refresh: MIN_REFRESH_INTERVAL,
            http: reqwest::Client::new(),
            cache: RwLock::new(None),
            last_attempt: Mutex::new(None),
        }
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk).map_err(AuthError::Invalid);
                    }
                }
            }
        }

        let keys = self.refresh_keys().await?;
        let jwk = keys.find(kid).ok_or_else(|| AuthError::UnknownKey(kid.to_string()))?;
        DecodingKey::from_jwk(jwk).map_err(AuthError::Invalid)
    }

    async fn refresh_keys(&self) -> Result<JwkSet, AuthError> {
        let mut last_attempt = self.last_attempt.lock().await;
        if let Some(at) = *last_attempt {
            if at.elapsed() < self.min_refresh {
                // Fetched recently, possibly by a concurrent caller
                debug!("Skipping signing key refresh, last attempt {:?} ago", at.elapsed());
                let cache = self.cache.read().await;
                return Ok(cache
                    .as_ref()
                    .map(|cached| cached.keys.clone())
                    .unwrap_or(JwkSet { keys: vec![] }));
            }
        }
        *last_attempt = Some(Instant::now());

        let keys: JwkSet = match self.fetch_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Signing key refresh from {} failed: {}", self.jwks_url, err);
                return Err(err);
            }
        };

        info!("Fetched {} signing keys from {}", keys.keys.len(), self.jwks_url);
        *self.cache.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        Ok(self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    #[cfg(test)]
    async fn seed_keys(&self, keys: JwkSet) {
        *self.last_attempt.lock().await = Some(Instant::now());
        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn verify_token(&self, token: &str) -> Result<ProviderUser, AuthError> {
        let header = decode_header(token).map_err(AuthError::Malformed)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        let key = self.decoding_key(&kid).await?;
        let data = decode::<FirebaseClaims>(token, &key, &self.validation()).map_err(AuthError::Invalid)?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        debug!("Verified token for uid {}", data.claims.sub);
        Ok(data.claims.into())
    }
}
