// src/handlers/auth.rs

use crate::{
    auth::{AuthUser, generate_token},
    errors::{AppError, AppResult},
    handlers::optional_text,
    models::{
        AuthResponse, LoginRequest, RegisterRequest, SetUserRoleRequest, User, UserProfile,
        UserRole,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::info;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

/// Register a new user.
/// The first account created becomes the admin; later ones start as viewers.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already exists"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = body.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash =
        hash(&body.password, DEFAULT_COST).map_err(|e| AppError::Internal(e.to_string()))?;

    let mut tx = state.db.begin().await?;

    // Serialises concurrent first registrations so only one becomes admin.
    sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    let role = if existing == 0 {
        UserRole::Admin
    } else {
        UserRole::Viewer
    };

    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (id, email, full_name, password_hash, role, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
           RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(optional_text(body.full_name))
    .bind(&password_hash)
    .bind(role)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, format!("User with email '{}' already exists", email)))?;

    tx.commit().await?;

    let token = generate_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    info!("Registered {} as {:?}", user.email, user.role);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = body.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = verify(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = generate_token(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Get the signed-in user's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<Json<UserProfile>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserProfile>),
        (status = 403, description = "Not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserProfile>>> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, UserProfile>(
        r#"SELECT id, email, full_name, role, created_at, updated_at
           FROM users ORDER BY created_at ASC"#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users))
}

/// Change a user's role (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/role",
    request_body = SetUserRoleRequest,
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role updated", body = UserProfile),
        (status = 400, description = "Admins cannot demote themselves"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn set_user_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetUserRoleRequest>,
) -> AppResult<Json<UserProfile>> {
    auth.require_admin()?;

    if user_id == auth.id && body.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "Admins cannot remove their own admin role".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, UserProfile>(
        r#"UPDATE users SET role = $1, updated_at = NOW()
           WHERE id = $2
           RETURNING id, email, full_name, role, created_at, updated_at"#,
    )
    .bind(body.role)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    info!("{} set role of {} to {:?}", auth.email, user.email, user.role);
    Ok(Json(user))
}
