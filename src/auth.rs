use crate::{
    errors::{AppError, AppResult},
    models::{Claims, UserRole},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;
use uuid::Uuid;

/// Authenticated user extractor.
/// Add `auth: AuthUser` as a parameter in any handler that requires authentication.
/// The role is read from the database on every request so role changes apply
/// immediately, without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn require_editor(&self) -> AppResult<()> {
        if self.role.can_edit_records() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only admin or finance users can modify records".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.can_manage_settings() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Only admins can change settings".to_string()))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user_id = verify_token(token, &state.config.jwt_secret)?;

        let row: Option<(Uuid, String, UserRole)> =
            sqlx::query_as("SELECT id, email, role FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&state.db)
                .await?;

        let (id, email, role) = row.ok_or_else(|| {
            warn!("Token for unknown user {}", user_id);
            AppError::InvalidToken
        })?;

        Ok(AuthUser { id, email, role })
    }
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))
}

pub fn generate_token(user_id: Uuid, secret: &str, expiry_hours: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(expiry_hours)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Returns the user id carried by a valid, unexpired token.
pub fn verify_token(token: &str, secret: &str) -> AppResult<Uuid> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Uuid::parse_str(&token_data.claims.sub).map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_round_trip() {
        let id = Uuid::new_v4();
        let token = generate_token(id, "secret", 1).unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap(), id);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = generate_token(Uuid::new_v4(), "secret", 1).unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_token(Uuid::new_v4(), "secret", -2).unwrap();
        assert!(matches!(verify_token(&token, "secret"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized(_))));

        headers.insert("Authorization", HeaderValue::from_static("Token abc"));
        assert!(matches!(bearer_token(&headers), Err(AppError::Unauthorized(_))));

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }

    #[test]
    fn viewers_cannot_edit() {
        let viewer = AuthUser {
            id: Uuid::new_v4(),
            email: "v@example.com".to_string(),
            role: UserRole::Viewer,
        };
        assert!(matches!(viewer.require_editor(), Err(AppError::Forbidden(_))));
        assert!(matches!(viewer.require_admin(), Err(AppError::Forbidden(_))));

        let finance = AuthUser { role: UserRole::Finance, ..viewer };
        assert!(finance.require_editor().is_ok());
        assert!(finance.require_admin().is_err());
    }
}
