// src/handlers/dashboard.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::AsOfQuery,
    services::{
        dashboard::{self, DashboardStats, PayrollExpensePoint},
        month::MonthTotal,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{NaiveDate, Utc};

fn today(query: &AsOfQuery) -> NaiveDate {
    query.as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Headline payroll, expense and asset figures in the reporting currency
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<DashboardStats>> {
    let stats = dashboard::dashboard_stats(&state.report_source(), today(&query)).await?;
    Ok(Json(stats))
}

/// Net payroll for each of the last 12 months, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/payroll-by-month",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Twelve monthly payroll totals", body = Vec<MonthTotal>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn payroll_by_month(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<MonthTotal>>> {
    let series = dashboard::payroll_by_month(&state.report_source(), today(&query)).await?;
    Ok(Json(series))
}

/// Payroll and day-to-day expenses for each of the last 12 months
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/payroll-and-expenses",
    params(AsOfQuery),
    responses(
        (status = 200, description = "Twelve monthly points", body = Vec<PayrollExpensePoint>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn payroll_and_expenses(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<PayrollExpensePoint>>> {
    let series =
        dashboard::payroll_and_expenses_by_month(&state.report_source(), today(&query)).await?;
    Ok(Json(series))
}
