// src/handlers/salary.rs

use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    handlers::{non_negative, optional_text},
    models::{
        AnalysisQuery, CreateSalaryRecordRequest, SalaryFilters, SalaryRecordDetail,
        SalaryStatus, UpdateSalaryRecordRequest,
    },
    services::analysis::{self, SalaryAnalysis},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

const SALARY_DETAIL_SELECT: &str = r#"SELECT s.*,
           e.full_name AS employee_name,
           e.employee_code,
           e.currency_id,
           c.code AS currency_code
    FROM salary_records s
    JOIN employees e ON e.id = s.employee_id
    LEFT JOIN currencies c ON c.id = e.currency_id"#;

async fn fetch_salary_detail<'e>(
    db: impl PgExecutor<'e>,
    record_id: Uuid,
) -> AppResult<SalaryRecordDetail> {
    let sql = format!("{} WHERE s.id = $1", SALARY_DETAIL_SELECT);
    sqlx::query_as::<_, SalaryRecordDetail>(&sql)
        .bind(record_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Salary record {} not found", record_id)))
}

/// Net salary must not go below zero once bonus and deductions apply.
fn check_net(base: Decimal, bonus: Decimal, deductions: Decimal) -> AppResult<()> {
    if base + bonus - deductions < Decimal::ZERO {
        return Err(AppError::Validation(
            "Deductions cannot exceed base salary plus bonus".to_string(),
        ));
    }
    Ok(())
}

/// List salary records, newest month first
#[utoipa::path(
    get,
    path = "/api/v1/salary",
    params(SalaryFilters),
    responses(
        (status = 200, description = "Salary records", body = Vec<SalaryRecordDetail>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn list_salary_records(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<SalaryFilters>,
) -> AppResult<Json<Vec<SalaryRecordDetail>>> {
    let mut qb = QueryBuilder::<Postgres>::new(SALARY_DETAIL_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(month) = filters.month {
        qb.push(" AND s.month = ").push_bind(month.first_day());
    }
    if let Some(employee_id) = filters.employee_id {
        qb.push(" AND s.employee_id = ").push_bind(employee_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND s.status = ").push_bind(status);
    }
    qb.push(" ORDER BY s.month DESC, e.full_name ASC");

    let records = qb
        .build_query_as::<SalaryRecordDetail>()
        .fetch_all(&state.db)
        .await?;

    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/v1/salary/{record_id}",
    params(("record_id" = Uuid, Path, description = "Salary record ID")),
    responses(
        (status = 200, description = "Salary record", body = SalaryRecordDetail),
        (status = 404, description = "Salary record not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_salary_record(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> AppResult<Json<SalaryRecordDetail>> {
    Ok(Json(fetch_salary_detail(&state.db, record_id).await?))
}

/// Record an employee's salary for a month
#[utoipa::path(
    post,
    path = "/api/v1/salary",
    request_body = CreateSalaryRecordRequest,
    responses(
        (status = 201, description = "Salary record created", body = SalaryRecordDetail),
        (status = 400, description = "Invalid amounts"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "A record already exists for that employee and month"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn create_salary_record(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateSalaryRecordRequest>,
) -> AppResult<(StatusCode, Json<SalaryRecordDetail>)> {
    auth.require_editor()?;

    let base_salary = non_negative(body.base_salary, "Base salary")?;
    let bonus = non_negative(body.bonus.unwrap_or_default(), "Bonus")?;
    let deductions = non_negative(body.deductions.unwrap_or_default(), "Deductions")?;
    check_net(base_salary, bonus, deductions)?;

    let employee: Option<Uuid> = sqlx::query_scalar("SELECT id FROM employees WHERE id = $1")
        .bind(body.employee_id)
        .fetch_optional(&state.db)
        .await?;
    if employee.is_none() {
        return Err(AppError::NotFound(format!(
            "Employee {} not found",
            body.employee_id
        )));
    }

    let record_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO salary_records (
            id, employee_id, month, base_salary, deductions, bonus, status,
            payment_date, comments, receipt_url, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,NOW(),NOW())
        RETURNING id"#,
    )
    .bind(Uuid::new_v4())
    .bind(body.employee_id)
    .bind(body.month.first_day())
    .bind(base_salary)
    .bind(deductions)
    .bind(bonus)
    .bind(body.status.unwrap_or(SalaryStatus::Pending))
    .bind(body.payment_date)
    .bind(optional_text(body.comments))
    .bind(optional_text(body.receipt_url))
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        AppError::conflict_on_unique(
            e,
            format!(
                "Employee {} already has a salary record for {}",
                body.employee_id, body.month
            ),
        )
    })?;

    info!(
        "Salary record {} for {} created by {}",
        record_id, body.month, auth.email
    );
    Ok((
        StatusCode::CREATED,
        Json(fetch_salary_detail(&state.db, record_id).await?),
    ))
}

/// Update a salary record. Only the supplied fields change.
#[utoipa::path(
    patch,
    path = "/api/v1/salary/{record_id}",
    request_body = UpdateSalaryRecordRequest,
    params(("record_id" = Uuid, Path, description = "Salary record ID")),
    responses(
        (status = 200, description = "Salary record updated", body = SalaryRecordDetail),
        (status = 400, description = "Invalid amounts"),
        (status = 404, description = "Salary record not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn update_salary_record(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(body): Json<UpdateSalaryRecordRequest>,
) -> AppResult<Json<SalaryRecordDetail>> {
    auth.require_editor()?;

    let current = fetch_salary_detail(&state.db, record_id).await?.record;

    let base_salary = body
        .base_salary
        .map(|v| non_negative(v, "Base salary"))
        .transpose()?;
    let bonus = body.bonus.map(|v| non_negative(v, "Bonus")).transpose()?;
    let deductions = body
        .deductions
        .map(|v| non_negative(v, "Deductions"))
        .transpose()?;
    check_net(
        base_salary.unwrap_or(current.base_salary),
        bonus.unwrap_or(current.bonus),
        deductions.unwrap_or(current.deductions),
    )?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE salary_records SET updated_at = NOW()");

    if let Some(base_salary) = base_salary {
        qb.push(", base_salary = ").push_bind(base_salary);
    }
    if let Some(bonus) = bonus {
        qb.push(", bonus = ").push_bind(bonus);
    }
    if let Some(deductions) = deductions {
        qb.push(", deductions = ").push_bind(deductions);
    }
    if let Some(status) = body.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(payment_date) = body.payment_date {
        qb.push(", payment_date = ").push_bind(payment_date);
    }
    if let Some(comments) = body.comments {
        qb.push(", comments = ").push_bind(optional_text(comments));
    }
    if let Some(receipt_url) = body.receipt_url {
        qb.push(", receipt_url = ").push_bind(optional_text(receipt_url));
    }
    qb.push(" WHERE id = ").push_bind(record_id);
    qb.build().execute(&state.db).await?;

    info!("Salary record {} updated by {}", record_id, auth.email);
    Ok(Json(fetch_salary_detail(&state.db, record_id).await?))
}

/// Per-employee and company salary analysis for a year
#[utoipa::path(
    get,
    path = "/api/v1/salary/analysis",
    params(AnalysisQuery),
    responses(
        (status = 200, description = "Salary analysis in the reporting currency", body = SalaryAnalysis),
        (status = 400, description = "Year out of range"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn salary_analysis(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> AppResult<Json<SalaryAnalysis>> {
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let year = query.year.unwrap_or_else(|| today.year());

    let analysis = analysis::salary_analysis(&state.report_source(), year, today).await?;
    Ok(Json(analysis))
}
