/**
 * Authentication Routes
 * Identity-provider bearer tokens, the admin check, and the status endpoint
 */
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Claims issued by the identity provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub is_admin: bool,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Verify an HS256 identity token against the shared secret
pub fn verify_identity_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn is_admin(principal: &Principal, admin_email: &str) -> bool {
    !admin_email.is_empty()
        && principal
            .email
            .as_deref()
            .is_some_and(|email| email.eq_ignore_ascii_case(admin_email))
}

pub fn auth_status(principal: Option<&Principal>, admin_email: &str) -> AuthStatus {
    match principal {
        None => AuthStatus {
            authenticated: false,
            is_admin: false,
            name: None,
            email: None,
        },
        Some(principal) => AuthStatus {
            authenticated: true,
            is_admin: is_admin(principal, admin_email),
            name: principal.name.clone(),
            email: principal.email.clone(),
        },
    }
}

/// The caller's principal, or `None` for anonymous and invalid tokens
pub struct MaybePrincipal(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybePrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = state.config.identity_secret.as_str();
        if secret.is_empty() {
            return Ok(Self(None));
        }

        let Some(token) = extract_bearer_token(&parts.headers) else {
            return Ok(Self(None));
        };

        match verify_identity_token(token, secret) {
            Ok(claims) => Ok(Self(Some(claims.into()))),
            Err(e) => {
                tracing::debug!(error = %e, "rejected identity token");
                Ok(Self(None))
            }
        }
    }
}

/// Requires the administrator: 401 when anonymous, 403 for anyone else
pub struct AdminPrincipal(pub Principal);

impl FromRequestParts<AppState> for AdminPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybePrincipal(principal) = MaybePrincipal::from_request_parts(parts, state)
            .await
            .unwrap_or(MaybePrincipal(None));

        let principal = principal.ok_or(AppError::Unauthorized)?;
        if !is_admin(&principal, &state.config.admin_email) {
            tracing::warn!(subject = %principal.subject, "non-admin attempted an admin action");
            return Err(AppError::Forbidden);
        }
        Ok(Self(principal))
    }
}

/// GET /api/auth/status
pub async fn status(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Json<AuthStatus> {
    Json(auth_status(principal.as_ref(), &state.config.admin_email))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub fn token_for(email: &str, secret: &str) -> String {
        let claims = Claims {
            sub: "user-1".to_string(),
            email: Some(email.to_string()),
            name: Some("Test User".to_string()),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    /// Bearer header value for the default test admin
    pub fn admin_bearer() -> String {
        format!("Bearer {}", token_for("admin@example.com", "test-identity-secret"))
    }

    pub fn user_bearer() -> String {
        format!("Bearer {}", token_for("someone@example.com", "test-identity-secret"))
    }
}
