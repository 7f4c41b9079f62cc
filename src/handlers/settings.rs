// src/handlers/settings.rs

use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    handlers::{optional_text, required_text},
    models::{
        CreateCurrencyRequest, Currency, Department, DepartmentRequest, ReportingCurrencySetting,
        UpdateCurrencyRequest,
    },
    services::{
        currency::{ExchangeRates, MAX_EXCHANGE_RATE},
        settings,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

// ─── Departments ──────────────────────────────────────────────────────────────

/// List departments, alphabetically
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "List of departments", body = Vec<Department>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_departments(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Department>>> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name ASC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments/{department_id}",
    params(("department_id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Department not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_department(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
) -> AppResult<Json<Department>> {
    let department = sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
        .bind(department_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Department {} not found", department_id)))?;

    Ok(Json(department))
}

/// Create a department (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = DepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Department name already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<DepartmentRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    auth.require_admin()?;
    let name = required_text(&body.name, "Department name")?;

    let department = sqlx::query_as::<_, Department>(
        "INSERT INTO departments (id, name, created_at) VALUES ($1, $2, NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, format!("Department '{}' already exists", name)))?;

    info!("Department '{}' created by {}", department.name, auth.email);
    Ok((StatusCode::CREATED, Json(department)))
}

/// Rename a department (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/departments/{department_id}",
    request_body = DepartmentRequest,
    params(("department_id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department renamed", body = Department),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department name already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
    Json(body): Json<DepartmentRequest>,
) -> AppResult<Json<Department>> {
    auth.require_admin()?;
    let name = required_text(&body.name, "Department name")?;

    let department = sqlx::query_as::<_, Department>(
        "UPDATE departments SET name = $1 WHERE id = $2 RETURNING *",
    )
    .bind(&name)
    .bind(department_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, format!("Department '{}' already exists", name)))?
    .ok_or_else(|| AppError::NotFound(format!("Department {} not found", department_id)))?;

    Ok(Json(department))
}

/// Delete a department (admin only). Employees in it are left without one.
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{department_id}",
    params(("department_id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(department_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(department_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Department {} not found", department_id)));
    }

    info!("Department {} deleted by {}", department_id, auth.email);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Currencies ───────────────────────────────────────────────────────────────

fn normalize_code(code: &str) -> AppResult<String> {
    Ok(required_text(code, "Currency code")?.to_uppercase())
}

#[utoipa::path(
    get,
    path = "/api/v1/currencies",
    responses(
        (status = 200, description = "List of currencies", body = Vec<Currency>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_currencies(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Currency>>> {
    let currencies =
        sqlx::query_as::<_, Currency>("SELECT * FROM currencies ORDER BY name ASC NULLS LAST, code ASC")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(currencies))
}

#[utoipa::path(
    get,
    path = "/api/v1/currencies/{currency_id}",
    params(("currency_id" = Uuid, Path, description = "Currency ID")),
    responses(
        (status = 200, description = "Currency", body = Currency),
        (status = 404, description = "Currency not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_currency(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(currency_id): Path<Uuid>,
) -> AppResult<Json<Currency>> {
    let currency = sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE id = $1")
        .bind(currency_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Currency {} not found", currency_id)))?;

    Ok(Json(currency))
}

/// Add a currency (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/currencies",
    request_body = CreateCurrencyRequest,
    responses(
        (status = 201, description = "Currency created", body = Currency),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Currency code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_currency(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateCurrencyRequest>,
) -> AppResult<(StatusCode, Json<Currency>)> {
    auth.require_admin()?;
    let code = normalize_code(&body.code)?;

    let currency = sqlx::query_as::<_, Currency>(
        "INSERT INTO currencies (id, code, name, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&code)
    .bind(optional_text(body.name))
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, format!("Currency '{}' already exists", code)))?;

    info!("Currency {} created by {}", currency.code, auth.email);
    Ok((StatusCode::CREATED, Json(currency)))
}

/// Update a currency's code or name (admin only)
#[utoipa::path(
    patch,
    path = "/api/v1/currencies/{currency_id}",
    request_body = UpdateCurrencyRequest,
    params(("currency_id" = Uuid, Path, description = "Currency ID")),
    responses(
        (status = 200, description = "Currency updated", body = Currency),
        (status = 404, description = "Currency not found"),
        (status = 409, description = "Currency code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_currency(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(currency_id): Path<Uuid>,
    Json(body): Json<UpdateCurrencyRequest>,
) -> AppResult<Json<Currency>> {
    auth.require_admin()?;

    let code = body.code.as_deref().map(normalize_code).transpose()?;
    // The no-op assignment keeps the statement valid when nothing was sent.
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE currencies SET id = id");
    if let Some(code) = &code {
        qb.push(", code = ").push_bind(code.clone());
    }
    if let Some(name) = body.name {
        qb.push(", name = ").push_bind(optional_text(name));
    }
    qb.push(" WHERE id = ").push_bind(currency_id).push(" RETURNING *");

    let currency = qb
        .build_query_as::<Currency>()
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(
                e,
                format!("Currency '{}' already exists", code.as_deref().unwrap_or_default()),
            )
        })?
        .ok_or_else(|| AppError::NotFound(format!("Currency {} not found", currency_id)))?;

    Ok(Json(currency))
}

/// Delete a currency (admin only). References to it are cleared.
#[utoipa::path(
    delete,
    path = "/api/v1/currencies/{currency_id}",
    params(("currency_id" = Uuid, Path, description = "Currency ID")),
    responses(
        (status = 204, description = "Currency deleted"),
        (status = 404, description = "Currency not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_currency(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(currency_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM currencies WHERE id = $1")
        .bind(currency_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Currency {} not found", currency_id)));
    }

    if settings::reporting_currency_id(&state.db).await? == Some(currency_id) {
        settings::set_reporting_currency_id(&state.db, None).await?;
        info!("Reporting currency cleared because it was deleted");
    }

    info!("Currency {} deleted by {}", currency_id, auth.email);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Reporting currency & exchange rates ──────────────────────────────────────

/// Get the currency dashboard amounts are converted into
#[utoipa::path(
    get,
    path = "/api/v1/settings/reporting-currency",
    responses(
        (status = 200, description = "Current reporting currency", body = ReportingCurrencySetting),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_reporting_currency(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ReportingCurrencySetting>> {
    let currency_id = settings::reporting_currency_id(&state.db).await?;
    Ok(Json(ReportingCurrencySetting { currency_id }))
}

/// Set or clear the reporting currency (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/settings/reporting-currency",
    request_body = ReportingCurrencySetting,
    responses(
        (status = 200, description = "Reporting currency saved", body = ReportingCurrencySetting),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Currency not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn set_reporting_currency(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ReportingCurrencySetting>,
) -> AppResult<Json<ReportingCurrencySetting>> {
    auth.require_admin()?;

    if let Some(id) = body.currency_id {
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM currencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Currency {} not found", id)));
        }
    }

    settings::set_reporting_currency_id(&state.db, body.currency_id).await?;
    info!("Reporting currency set to {:?} by {}", body.currency_id, auth.email);

    Ok(Json(body))
}

/// Get exchange rates into the reporting currency
#[utoipa::path(
    get,
    path = "/api/v1/settings/exchange-rates",
    responses(
        (status = 200, description = "Rates keyed by currency id", body = ExchangeRates),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_exchange_rates(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<ExchangeRates>> {
    Ok(Json(settings::exchange_rates(&state.db).await?))
}

/// Replace exchange rates (admin only).
/// Rates for the reporting currency itself and zero rates are dropped.
#[utoipa::path(
    put,
    path = "/api/v1/settings/exchange-rates",
    request_body = ExchangeRates,
    responses(
        (status = 200, description = "Rates saved", body = ExchangeRates),
        (status = 400, description = "Negative or out-of-range rate"),
        (status = 403, description = "Not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn set_exchange_rates(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ExchangeRates>,
) -> AppResult<Json<ExchangeRates>> {
    auth.require_admin()?;

    if body.has_negative_rate() {
        return Err(AppError::Validation("Exchange rates cannot be negative".to_string()));
    }
    if body.has_rate_above_max() {
        return Err(AppError::Validation(format!(
            "Exchange rates cannot exceed {}",
            MAX_EXCHANGE_RATE
        )));
    }

    let reporting = settings::reporting_currency_id(&state.db).await?;
    let rates = body.cleaned(reporting);
    settings::set_exchange_rates(&state.db, &rates).await?;
    if rates.is_empty() {
        info!("Exchange rates cleared by {}", auth.email);
    } else {
        info!("{} exchange rates saved by {}", rates.len(), auth.email);
    }

    Ok(Json(rates))
}
