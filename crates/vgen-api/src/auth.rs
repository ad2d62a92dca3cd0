//! Bearer-token authentication and label-based access control.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims carried by the dashboard's bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub role: String,
    /// Labels the user may act on
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub exp: usize,
}

/// Authenticated user extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: String,
    pub label_ids: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Admins may act on any label; everyone else only on their own.
    pub fn can_access_label(&self, label_id: &str) -> bool {
        self.is_admin() || self.label_ids.iter().any(|l| l == label_id)
    }

    pub fn ensure_label_access(&self, label_id: &str) -> Result<(), ApiError> {
        if self.can_access_label(label_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "No access to label {label_id}"
            )))
        }
    }
}

/// Verify a bearer token against the configured secret.
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {e}")))?;

    Ok(AuthUser {
        id: data.claims.sub,
        role: data.claims.role,
        label_ids: data.claims.label_ids,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected Bearer token"))?;

        let user = verify_token(token, &state.config.jwt_secret)?;
        debug!(user_id = %user.id, role = %user.role, "Authenticated request");
        Ok(user)
    }
}
