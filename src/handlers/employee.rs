use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    handlers::{non_negative, optional_text, required_text},
    models::{
        CreateEmployeeRequest, Employee, EmployeeDetail, EmployeeFilters, EmployeeStatus,
        UpdateEmployeeRequest,
    },
    services::month::YearMonth,
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

const EMPLOYEE_DETAIL_SELECT: &str = r#"SELECT e.*, d.name AS department_name, c.code AS currency_code
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN currencies c ON c.id = e.currency_id"#;

async fn fetch_employee_detail<'e>(
    db: impl PgExecutor<'e>,
    employee_id: Uuid,
) -> AppResult<EmployeeDetail> {
    let sql = format!("{} WHERE e.id = $1", EMPLOYEE_DETAIL_SELECT);
    sqlx::query_as::<_, EmployeeDetail>(&sql)
        .bind(employee_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee_id)))
}

/// Onboard a new employee.
/// A pending salary record for the joining month is created alongside.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeDetail),
        (status = 400, description = "Invalid employee data"),
        (status = 403, description = "Read-only user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn create_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<EmployeeDetail>)> {
    auth.require_editor()?;

    let full_name = required_text(&body.full_name, "Full name")?;
    let email = required_text(&body.email, "Email")?;
    let monthly_salary = non_negative(body.monthly_salary, "Monthly salary")?;
    let employee_id = Uuid::new_v4();

    let mut tx = state.db.begin().await?;

    let employee = sqlx::query_as::<_, Employee>(
        r#"INSERT INTO employees (
            id, full_name, employee_code, department_id, job_title, email,
            monthly_salary, joining_date, payment_method_notes, status,
            country, city, currency_id, phone, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,NOW(),NOW())
        RETURNING *"#,
    )
    .bind(employee_id)
    .bind(&full_name)
    .bind(optional_text(body.employee_code))
    .bind(body.department_id)
    .bind(optional_text(body.job_title))
    .bind(&email)
    .bind(monthly_salary)
    .bind(body.joining_date)
    .bind(optional_text(body.payment_method_notes))
    .bind(body.status.unwrap_or(EmployeeStatus::Active))
    .bind(body.country.trim())
    .bind(body.city.trim())
    .bind(body.currency_id)
    .bind(optional_text(body.phone))
    .fetch_one(&mut *tx)
    .await?;

    let joining_month = YearMonth::from_date(employee.joining_date);
    sqlx::query(
        r#"INSERT INTO salary_records (
            id, employee_id, month, base_salary, deductions, bonus, status, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, 0, 0, 'pending', NOW(), NOW())"#,
    )
    .bind(Uuid::new_v4())
    .bind(employee.id)
    .bind(joining_month.first_day())
    .bind(employee.monthly_salary)
    .execute(&mut *tx)
    .await?;

    let detail = fetch_employee_detail(&mut *tx, employee.id).await?;
    tx.commit().await?;

    info!(
        "Employee {} onboarded by {} with a {} salary record",
        detail.employee.full_name, auth.email, joining_month
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List employees, optionally filtered
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeFilters),
    responses(
        (status = 200, description = "List of employees", body = Vec<EmployeeDetail>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn list_employees(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<EmployeeFilters>,
) -> AppResult<Json<Vec<EmployeeDetail>>> {
    let mut qb = QueryBuilder::<Postgres>::new(EMPLOYEE_DETAIL_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(department_id) = filters.department_id {
        qb.push(" AND e.department_id = ").push_bind(department_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND e.status = ").push_bind(status);
    }
    if let Some(country) = optional_text(filters.country) {
        qb.push(" AND LOWER(e.country) = LOWER(").push_bind(country).push(")");
    }
    if let Some(city) = optional_text(filters.city) {
        qb.push(" AND LOWER(e.city) = LOWER(").push_bind(city).push(")");
    }
    if let Some(currency_id) = filters.currency_id {
        qb.push(" AND e.currency_id = ").push_bind(currency_id);
    }
    qb.push(" ORDER BY e.full_name ASC");

    let employees = qb
        .build_query_as::<EmployeeDetail>()
        .fetch_all(&state.db)
        .await?;

    Ok(Json(employees))
}

/// Get a single employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee detail", body = EmployeeDetail),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn get_employee(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<EmployeeDetail>> {
    Ok(Json(fetch_employee_detail(&state.db, employee_id).await?))
}

/// Update an employee. Only the supplied fields change.
#[utoipa::path(
    patch,
    path = "/api/v1/employees/{employee_id}",
    request_body = UpdateEmployeeRequest,
    params(("employee_id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee updated", body = EmployeeDetail),
        (status = 400, description = "Invalid employee data"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn update_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    Json(body): Json<UpdateEmployeeRequest>,
) -> AppResult<Json<EmployeeDetail>> {
    auth.require_editor()?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE employees SET updated_at = NOW()");

    if let Some(full_name) = body.full_name {
        qb.push(", full_name = ")
            .push_bind(required_text(&full_name, "Full name")?);
    }
    if let Some(employee_code) = body.employee_code {
        qb.push(", employee_code = ").push_bind(optional_text(employee_code));
    }
    if let Some(department_id) = body.department_id {
        qb.push(", department_id = ").push_bind(department_id);
    }
    if let Some(job_title) = body.job_title {
        qb.push(", job_title = ").push_bind(optional_text(job_title));
    }
    if let Some(email) = body.email {
        qb.push(", email = ").push_bind(required_text(&email, "Email")?);
    }
    if let Some(monthly_salary) = body.monthly_salary {
        qb.push(", monthly_salary = ")
            .push_bind(non_negative(monthly_salary, "Monthly salary")?);
    }
    if let Some(joining_date) = body.joining_date {
        qb.push(", joining_date = ").push_bind(joining_date);
    }
    if let Some(notes) = body.payment_method_notes {
        qb.push(", payment_method_notes = ").push_bind(optional_text(notes));
    }
    if let Some(status) = body.status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(country) = body.country {
        qb.push(", country = ").push_bind(country.trim().to_string());
    }
    if let Some(city) = body.city {
        qb.push(", city = ").push_bind(city.trim().to_string());
    }
    if let Some(currency_id) = body.currency_id {
        qb.push(", currency_id = ").push_bind(currency_id);
    }
    if let Some(phone) = body.phone {
        qb.push(", phone = ").push_bind(optional_text(phone));
    }
    qb.push(" WHERE id = ").push_bind(employee_id);

    let result = qb.build().execute(&state.db).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Employee {} not found", employee_id)));
    }

    info!("Employee {} updated by {}", employee_id, auth.email);
    Ok(Json(fetch_employee_detail(&state.db, employee_id).await?))
}

async fn set_status(
    state: &AppState,
    employee_id: Uuid,
    status: EmployeeStatus,
) -> AppResult<EmployeeDetail> {
    let result =
        sqlx::query("UPDATE employees SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(employee_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Employee {} not found", employee_id)));
    }

    fetch_employee_detail(&state.db, employee_id).await
}

/// Deactivate an employee. Employees are never deleted.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/deactivate",
    params(("employee_id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated", body = EmployeeDetail),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<EmployeeDetail>> {
    auth.require_editor()?;
    let employee = set_status(&state, employee_id, EmployeeStatus::Inactive).await?;
    info!("Employee {} deactivated by {}", employee_id, auth.email);
    Ok(Json(employee))
}

/// Reactivate an employee
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/activate",
    params(("employee_id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee activated", body = EmployeeDetail),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn activate_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<EmployeeDetail>> {
    auth.require_editor()?;
    let employee = set_status(&state, employee_id, EmployeeStatus::Active).await?;
    info!("Employee {} activated by {}", employee_id, auth.email);
    Ok(Json(employee))
}
