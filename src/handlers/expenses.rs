// src/handlers/expenses.rs

use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    handlers::{non_negative, optional_text, required_text},
    models::{
        AssetStatus, CreateDayToDayExpenseRequest, CreateFixedAssetRequest, DayToDayExpense,
        DayToDayExpenseFilters, ExpensePaymentStatus, FixedAssetDetail, FixedAssetFilters,
        UpdateDayToDayExpenseRequest, UpdateFixedAssetRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

// ─── Fixed Assets ─────────────────────────────────────────────────────────────

const ASSET_DETAIL_SELECT: &str = r#"SELECT a.*,
           e.full_name AS assigned_employee_name,
           e.employee_code AS assigned_employee_code
    FROM fixed_assets a
    LEFT JOIN employees e ON e.id = a.assigned_employee_id"#;

async fn fetch_asset_detail<'e>(
    db: impl PgExecutor<'e>,
    asset_id: Uuid,
) -> AppResult<FixedAssetDetail> {
    let sql = format!("{} WHERE a.id = $1", ASSET_DETAIL_SELECT);
    sqlx::query_as::<_, FixedAssetDetail>(&sql)
        .bind(asset_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Fixed asset {} not found", asset_id)))
}

#[utoipa::path(
    get,
    path = "/api/v1/fixed-assets",
    params(FixedAssetFilters),
    responses(
        (status = 200, description = "Fixed assets", body = Vec<FixedAssetDetail>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn list_fixed_assets(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<FixedAssetFilters>,
) -> AppResult<Json<Vec<FixedAssetDetail>>> {
    let mut qb = QueryBuilder::<Postgres>::new(ASSET_DETAIL_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(asset_type) = filters.asset_type {
        qb.push(" AND a.asset_type = ").push_bind(asset_type);
    }
    if let Some(status) = filters.status {
        qb.push(" AND a.status = ").push_bind(status);
    }
    qb.push(" ORDER BY a.purchase_date DESC, a.asset_name ASC");

    let assets = qb
        .build_query_as::<FixedAssetDetail>()
        .fetch_all(&state.db)
        .await?;

    Ok(Json(assets))
}

/// Register a fixed asset
#[utoipa::path(
    post,
    path = "/api/v1/fixed-assets",
    request_body = CreateFixedAssetRequest,
    responses(
        (status = 201, description = "Fixed asset created", body = FixedAssetDetail),
        (status = 400, description = "Invalid asset data"),
        (status = 403, description = "Read-only user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn create_fixed_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateFixedAssetRequest>,
) -> AppResult<(StatusCode, Json<FixedAssetDetail>)> {
    auth.require_editor()?;

    let asset_name = required_text(&body.asset_name, "Asset name")?;
    let cost = non_negative(body.cost, "Cost")?;

    let asset_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO fixed_assets (
            id, asset_name, asset_type, purchase_date, cost, currency_id,
            assigned_employee_id, depreciation_rate, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,NOW(),NOW())
        RETURNING id"#,
    )
    .bind(Uuid::new_v4())
    .bind(&asset_name)
    .bind(body.asset_type)
    .bind(body.purchase_date)
    .bind(cost)
    .bind(body.currency_id)
    .bind(body.assigned_employee_id)
    .bind(body.depreciation_rate)
    .bind(body.status.unwrap_or(AssetStatus::Active))
    .fetch_one(&state.db)
    .await?;

    info!("Fixed asset '{}' registered by {}", asset_name, auth.email);
    Ok((
        StatusCode::CREATED,
        Json(fetch_asset_detail(&state.db, asset_id).await?),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/fixed-assets/{asset_id}",
    request_body = UpdateFixedAssetRequest,
    params(("asset_id" = Uuid, Path, description = "Fixed asset ID")),
    responses(
        (status = 200, description = "Fixed asset updated", body = FixedAssetDetail),
        (status = 404, description = "Fixed asset not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn update_fixed_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    Json(body): Json<UpdateFixedAssetRequest>,
) -> AppResult<Json<FixedAssetDetail>> {
    auth.require_editor()?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE fixed_assets SET updated_at = NOW()");

    if let Some(asset_name) = body.asset_name {
        qb.push(", asset_name = ")
            .push_bind(required_text(&asset_name, "Asset name")?);
    }
    if let Some(asset_type) = body.asset_type {
        qb.push(", asset_type = ").push_bind(asset_type);
    }
    if let Some(purchase_date) = body.purchase_date {
        qb.push(", purchase_date = ").push_bind(purchase_date);
    }
    if let Some(cost) = body.cost {
        qb.push(", cost = ").push_bind(non_negative(cost, "Cost")?);
    }
    if let Some(currency_id) = body.currency_id {
        qb.push(", currency_id = ").push_bind(currency_id);
    }
    if let Some(employee_id) = body.assigned_employee_id {
        qb.push(", assigned_employee_id = ").push_bind(employee_id);
    }
    if let Some(rate) = body.depreciation_rate {
        qb.push(", depreciation_rate = ").push_bind(rate);
    }
    if let Some(status) = body.status {
        qb.push(", status = ").push_bind(status);
    }
    qb.push(" WHERE id = ").push_bind(asset_id);

    let result = qb.build().execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Fixed asset {} not found", asset_id)));
    }

    info!("Fixed asset {} updated by {}", asset_id, auth.email);
    Ok(Json(fetch_asset_detail(&state.db, asset_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/fixed-assets/{asset_id}",
    params(("asset_id" = Uuid, Path, description = "Fixed asset ID")),
    responses(
        (status = 204, description = "Fixed asset deleted"),
        (status = 404, description = "Fixed asset not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn delete_fixed_asset(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_editor()?;

    let result = sqlx::query("DELETE FROM fixed_assets WHERE id = $1")
        .bind(asset_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Fixed asset {} not found", asset_id)));
    }

    info!("Fixed asset {} deleted by {}", asset_id, auth.email);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Day-to-day Expenses ──────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(DayToDayExpenseFilters),
    responses(
        (status = 200, description = "Day-to-day expenses", body = Vec<DayToDayExpense>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn list_expenses(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<DayToDayExpenseFilters>,
) -> AppResult<Json<Vec<DayToDayExpense>>> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM day_to_day_expenses WHERE TRUE");

    if let Some(category) = filters.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(payment_status) = filters.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status);
    }
    if let Some(month) = filters.month {
        let next = month
            .next()
            .ok_or_else(|| AppError::BadRequest(format!("Month {} is out of range", month)))?;
        qb.push(" AND date >= ")
            .push_bind(month.first_day())
            .push(" AND date < ")
            .push_bind(next.first_day());
    }
    qb.push(" ORDER BY date DESC, created_at DESC");

    let expenses = qb
        .build_query_as::<DayToDayExpense>()
        .fetch_all(&state.db)
        .await?;

    Ok(Json(expenses))
}

/// Record a day-to-day expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateDayToDayExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = DayToDayExpense),
        (status = 400, description = "Invalid expense data"),
        (status = 403, description = "Read-only user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn create_expense(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateDayToDayExpenseRequest>,
) -> AppResult<(StatusCode, Json<DayToDayExpense>)> {
    auth.require_editor()?;

    let vendor = required_text(&body.vendor, "Vendor")?;
    let amount = non_negative(body.amount, "Amount")?;

    let expense = sqlx::query_as::<_, DayToDayExpense>(
        r#"INSERT INTO day_to_day_expenses (
            id, category, vendor, date, amount, currency_id,
            payment_status, receipt_url, notes, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,NOW(),NOW())
        RETURNING *"#,
    )
    .bind(Uuid::new_v4())
    .bind(body.category)
    .bind(&vendor)
    .bind(body.date)
    .bind(amount)
    .bind(body.currency_id)
    .bind(body.payment_status.unwrap_or(ExpensePaymentStatus::Pending))
    .bind(optional_text(body.receipt_url))
    .bind(optional_text(body.notes))
    .fetch_one(&state.db)
    .await?;

    info!(
        "Expense {} from {} recorded by {}",
        expense.amount, expense.vendor, auth.email
    );
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/expenses/{expense_id}",
    request_body = UpdateDayToDayExpenseRequest,
    params(("expense_id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 200, description = "Expense updated", body = DayToDayExpense),
        (status = 404, description = "Expense not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn update_expense(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(body): Json<UpdateDayToDayExpenseRequest>,
) -> AppResult<Json<DayToDayExpense>> {
    auth.require_editor()?;

    let mut qb =
        QueryBuilder::<Postgres>::new("UPDATE day_to_day_expenses SET updated_at = NOW()");

    if let Some(category) = body.category {
        qb.push(", category = ").push_bind(category);
    }
    if let Some(vendor) = body.vendor {
        qb.push(", vendor = ").push_bind(required_text(&vendor, "Vendor")?);
    }
    if let Some(date) = body.date {
        qb.push(", date = ").push_bind(date);
    }
    if let Some(amount) = body.amount {
        qb.push(", amount = ").push_bind(non_negative(amount, "Amount")?);
    }
    if let Some(currency_id) = body.currency_id {
        qb.push(", currency_id = ").push_bind(currency_id);
    }
    if let Some(payment_status) = body.payment_status {
        qb.push(", payment_status = ").push_bind(payment_status);
    }
    if let Some(receipt_url) = body.receipt_url {
        qb.push(", receipt_url = ").push_bind(optional_text(receipt_url));
    }
    if let Some(notes) = body.notes {
        qb.push(", notes = ").push_bind(optional_text(notes));
    }
    qb.push(" WHERE id = ").push_bind(expense_id).push(" RETURNING *");

    let expense = qb
        .build_query_as::<DayToDayExpense>()
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Expense {} not found", expense_id)))?;

    info!("Expense {} updated by {}", expense_id, auth.email);
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{expense_id}",
    params(("expense_id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn delete_expense(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_editor()?;

    let result = sqlx::query("DELETE FROM day_to_day_expenses WHERE id = $1")
        .bind(expense_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Expense {} not found", expense_id)));
    }

    info!("Expense {} deleted by {}", expense_id, auth.email);
    Ok(StatusCode::NO_CONTENT)
}
