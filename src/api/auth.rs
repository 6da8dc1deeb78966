//! Bearer token check.
//!
//! Tokens are issued elsewhere; this only verifies them (HS256). The caller's
//! [`Principal`] is recorded on a span wrapping the rest of the request, so
//! every log line a handler emits is attributed.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::{Result, WarehouseError};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub exp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self { Self { user_id: c.id, username: c.username, role: c.role } }
}

#[derive(Clone)]
pub struct Authenticator {
    key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self { key: DecodingKey::from_secret(secret), validation: Validation::new(Algorithm::HS256) }
    }

    /// Invalid, expired or foreign tokens are all `Forbidden`.
    pub fn verify(&self, token: &str) -> Result<Principal> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                WarehouseError::Forbidden
            })
    }
}

fn bearer(headers: &HeaderMap) -> Result<&str> {
    let value = headers.get(header::AUTHORIZATION).ok_or(WarehouseError::Unauthorized)?;
    let value = value.to_str().map_err(|_| WarehouseError::Unauthorized)?;
    let token = value.strip_prefix("Bearer ").ok_or(WarehouseError::Unauthorized)?.trim();
    if token.is_empty() {
        return Err(WarehouseError::Unauthorized);
    }
    Ok(token)
}

pub async fn require_bearer(State(auth): State<Authenticator>, req: Request, next: Next) -> Result<Response> {
    let principal = auth.verify(bearer(req.headers())?)?;
    let span = tracing::info_span!("principal", user_id = principal.user_id, username = %principal.username, role = %principal.role);
    Ok(next.run(req).instrument(span).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    fn token(secret: &str, exp: u64) -> String {
        let claims = Claims { id: 7, username: "clerk".into(), role: "staff".into(), exp };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn later() -> u64 { (chrono::Utc::now().timestamp() + 600) as u64 }

    #[test]
    fn valid_token_yields_principal() {
        let auth = Authenticator::new(b"secret");
        let principal = auth.verify(&token("secret", later())).unwrap();
        assert_eq!(principal, Principal { user_id: 7, username: "clerk".into(), role: "staff".into() });
    }

    #[test]
    fn wrong_secret_or_expired_is_forbidden() {
        let auth = Authenticator::new(b"secret");
        assert!(matches!(auth.verify(&token("other", later())), Err(WarehouseError::Forbidden)));
        assert!(matches!(auth.verify(&token("secret", 1_000)), Err(WarehouseError::Forbidden)));
        assert!(matches!(auth.verify("garbage"), Err(WarehouseError::Forbidden)));
    }

    #[test]
    fn header_must_be_a_bearer() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer(&headers), Err(WarehouseError::Unauthorized)));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer(&headers), Err(WarehouseError::Unauthorized)));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer(&headers).unwrap(), "abc");
    }

    #[tokio::test]
    async fn middleware_gates_the_route() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(Authenticator::new(b"secret"), require_bearer));
        let status = |authorization: Option<String>| {
            let app = app.clone();
            async move {
                let mut req = axum::http::Request::builder().uri("/");
                if let Some(value) = authorization {
                    req = req.header(header::AUTHORIZATION, value);
                }
                app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap().status()
            }
        };

        assert_eq!(status(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(Some(format!("Bearer {}", token("other", later())))).await, StatusCode::FORBIDDEN);
        assert_eq!(status(Some(format!("Bearer {}", token("secret", later())))).await, StatusCode::OK);
    }
}
