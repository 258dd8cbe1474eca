//! HTTP Basic authentication gate.
//!
//! Runs before routing, so a request with bad credentials is answered with
//! an empty 401 before its body is read or any method is dispatched.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use dockhand_core::config::AuthConfig;

use crate::state::AppState;

/// Credentials extracted from a Basic auth header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    NotBasicAuth,
    InvalidEncoding,
    InvalidFormat,
    BadCredentials,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MissingHeader => "missing Authorization header",
            Self::NotBasicAuth => "not Basic authentication",
            Self::InvalidEncoding => "invalid base64 encoding",
            Self::InvalidFormat => "invalid credentials format",
            Self::BadCredentials => "credentials do not match",
        };
        f.write_str(text)
    }
}

/// Extracts Basic credentials from request headers.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, AuthFailure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?
        .to_str()
        .map_err(|_| AuthFailure::InvalidEncoding)?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or(AuthFailure::NotBasicAuth)?;

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| AuthFailure::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthFailure::InvalidEncoding)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthFailure::InvalidFormat)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Checks the request against the configured API key and secret.
pub fn authorize(headers: &HeaderMap, expected: &AuthConfig) -> Result<(), AuthFailure> {
    let credentials = extract_basic_credentials(headers)?;

    let key_ok = constant_time_eq(credentials.username.as_bytes(), expected.api_key.as_bytes());
    let secret_ok = constant_time_eq(
        credentials.password.as_bytes(),
        expected.api_secret.as_bytes(),
    );

    if key_ok && secret_ok {
        Ok(())
    } else {
        Err(AuthFailure::BadCredentials)
    }
}

/// Middleware rejecting every request without matching Basic credentials.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(reason) = authorize(request.headers(), &state.auth) {
        debug!(path = %request.uri().path(), reason = %reason, "Rejected unauthenticated request");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(request).await
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        }
    }

    fn headers(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(raw).expect("header"),
        );
        headers
    }

    fn basic(user: &str, pass: &str) -> HeaderMap {
        headers(&format!("Basic {}", BASE64.encode(format!("{user}:{pass}"))))
    }

    #[test]
    fn test_matching_credentials() {
        assert_eq!(authorize(&basic("key", "secret"), &config()), Ok(()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let expected = AuthConfig {
            api_key: "key".to_string(),
            api_secret: "se:cret".to_string(),
        };
        assert_eq!(authorize(&basic("key", "se:cret"), &expected), Ok(()));
    }

    #[test]
    fn test_rejections() {
        let cfg = config();
        assert_eq!(
            authorize(&HeaderMap::new(), &cfg),
            Err(AuthFailure::MissingHeader)
        );
        assert_eq!(
            authorize(&headers("Bearer abc"), &cfg),
            Err(AuthFailure::NotBasicAuth)
        );
        assert_eq!(
            authorize(&headers("Basic !!!"), &cfg),
            Err(AuthFailure::InvalidEncoding)
        );
        assert_eq!(
            authorize(&headers(&format!("Basic {}", BASE64.encode("nocolon"))), &cfg),
            Err(AuthFailure::InvalidFormat)
        );
        assert_eq!(
            authorize(&basic("secret", "key"), &cfg),
            Err(AuthFailure::BadCredentials)
        );
        assert_eq!(
            authorize(&basic("key", "secre"), &cfg),
            Err(AuthFailure::BadCredentials)
        );
    }
}
