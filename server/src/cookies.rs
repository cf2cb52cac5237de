use std::ops::Deref;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse as _, Response},
};
use base64::Engine as _;
use color_eyre::eyre::{eyre, WrapErr as _};
use tracing::{error, warn};

pub use tower_cookies::Cookie;

use crate::state::AppState;

/// Key used to encrypt and sign the private cookies
#[derive(Clone)]
pub struct CookieKey(tower_cookies::Key);

impl CookieKey {
    pub fn from_env_or_generate() -> color_eyre::Result<Self> {
        match std::env::var("COOKIE_KEY") {
            Ok(encoded) => Self::from_base64(&encoded),
            Err(_) => {
                warn!("COOKIE_KEY not set, generating a random key. Sessions will not survive a restart");
                Ok(Self::generate())
            }
        }
    }

    pub fn from_base64(encoded: &str) -> color_eyre::Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .wrap_err("COOKIE_KEY must be valid base64")?;

        let key = tower_cookies::Key::try_from(bytes.as_slice())
            .map_err(|e| eyre!("COOKIE_KEY must decode to at least 64 bytes: {e}"))?;

        Ok(Self(key))
    }

    pub fn generate() -> Self {
        Self(tower_cookies::Key::generate())
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0.master())
    }
}

impl Deref for CookieKey {
    type Target = tower_cookies::Key;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct CookieJar {
    cookies: tower_cookies::Cookies,
    state: AppState,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = match tower_cookies::Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(_) => {
                error!("Failed to extract cookies from request");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        Ok(CookieJar {
            cookies,
            state: state.clone(),
        })
    }
}

impl CookieJar {
    /// Add a new private cookie
    pub fn add(&self, cookie: Cookie<'static>) {
        let private = self.cookies.private(&self.state.cookie_key);
        private.add(cookie);
    }

    /// Get a private cookie by name
    pub fn get(&self, name: &str) -> Option<Cookie<'static>> {
        let private = self.cookies.private(&self.state.cookie_key);
        private.get(name)
    }

    /// Removes the `cookie` from the jar.
    pub fn remove(&self, cookie: Cookie<'static>) {
        let private = self.cookies.private(&self.state.cookie_key);
        private.remove(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_base64_roundtrip() -> color_eyre::Result<()> {
        let key = CookieKey::generate();
        let restored = CookieKey::from_base64(&key.to_base64())?;

        assert_eq!(key.master(), restored.master());
        Ok(())
    }

    #[test]
    fn test_cookie_key_rejects_short_keys() {
        let short = base64::engine::general_purpose::STANDARD.encode([7u8; 16]);
        assert!(CookieKey::from_base64(&short).is_err());
        assert!(CookieKey::from_base64("not base64!!").is_err());
    }
}
