// src/routes/mod.rs

use crate::{
    handlers::{auth, dashboard, employee, expenses, general, salary, settings},
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Auth & Users ─────────────────────────────────────
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users", get(auth::list_users))
        .route("/users/{user_id}/role", patch(auth::set_user_role))
        // ─── Settings ─────────────────────────────────────────
        .route(
            "/departments",
            get(settings::list_departments).post(settings::create_department),
        )
        .route(
            "/departments/{department_id}",
            get(settings::get_department)
                .patch(settings::update_department)
                .delete(settings::delete_department),
        )
        .route(
            "/currencies",
            get(settings::list_currencies).post(settings::create_currency),
        )
        .route(
            "/currencies/{currency_id}",
            get(settings::get_currency)
                .patch(settings::update_currency)
                .delete(settings::delete_currency),
        )
        .route(
            "/settings/reporting-currency",
            get(settings::get_reporting_currency).put(settings::set_reporting_currency),
        )
        .route(
            "/settings/exchange-rates",
            get(settings::get_exchange_rates).put(settings::set_exchange_rates),
        )
        // ─── Employees ────────────────────────────────────────
        .route(
            "/employees",
            post(employee::create_employee).get(employee::list_employees),
        )
        .route(
            "/employees/{employee_id}",
            get(employee::get_employee).patch(employee::update_employee),
        )
        .route(
            "/employees/{employee_id}/deactivate",
            post(employee::deactivate_employee),
        )
        .route(
            "/employees/{employee_id}/activate",
            post(employee::activate_employee),
        )
        // ─── Salary ───────────────────────────────────────────
        .route(
            "/salary",
            get(salary::list_salary_records).post(salary::create_salary_record),
        )
        .route("/salary/analysis", get(salary::salary_analysis))
        .route(
            "/salary/{record_id}",
            get(salary::get_salary_record).patch(salary::update_salary_record),
        )
        // ─── Expenses ─────────────────────────────────────────
        .route(
            "/fixed-assets",
            get(expenses::list_fixed_assets).post(expenses::create_fixed_asset),
        )
        .route(
            "/fixed-assets/{asset_id}",
            patch(expenses::update_fixed_asset).delete(expenses::delete_fixed_asset),
        )
        .route(
            "/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/expenses/{expense_id}",
            patch(expenses::update_expense).delete(expenses::delete_expense),
        )
        // ─── Dashboard ────────────────────────────────────────
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/payroll-by-month", get(dashboard::payroll_by_month))
        .route(
            "/dashboard/payroll-and-expenses",
            get(dashboard::payroll_and_expenses),
        )
}

/// The full application: landing page, health, versioned API and Swagger UI.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(general::root_handler))
        .route("/health", get(general::health_handler))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
