use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::json;

/// Root handler: an HTML landing page listing the API surface
pub async fn root_handler() -> impl IntoResponse {
    Html(r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Payroll Dashboard API</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: 'Segoe UI', system-ui, sans-serif; background: #0f172a; color: #e2e8f0; min-height: 100vh; padding: 40px 20px; }
    .container { max-width: 860px; margin: 0 auto; }
    header { text-align: center; margin-bottom: 48px; }
    header h1 { font-size: 2.6rem; font-weight: 800; color: #38bdf8; margin-bottom: 8px; }
    header p { color: #94a3b8; font-size: 1.1rem; }
    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 16px; margin-bottom: 32px; }
    .card { background: #1e293b; border: 1px solid #334155; border-radius: 12px; padding: 20px; }
    .card h3 { font-size: 1rem; color: #f1f5f9; margin-bottom: 6px; }
    .card p { font-size: 0.875rem; color: #94a3b8; line-height: 1.5; }
    .card a { color: #38bdf8; text-decoration: none; display: inline-block; margin-top: 8px; font-size: 0.875rem; }
    .routes { background: #1e293b; border: 1px solid #334155; border-radius: 12px; padding: 24px; }
    .routes h4 { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: #64748b; margin: 16px 0 8px; }
    .route { font-family: monospace; font-size: 0.85rem; padding: 4px 0; }
    .method { display: inline-block; min-width: 64px; color: #34d399; }
  </style>
</head>
<body>
<div class="container">
  <header>
    <h1>Payroll Dashboard API</h1>
    <p>Employees, monthly salaries and office expenses, reported in one currency</p>
  </header>

  <div class="grid">
    <div class="card">
      <h3>API Documentation</h3>
      <p>Interactive Swagger UI with every endpoint and schema.</p>
      <a href="/docs">Open Swagger UI</a>
    </div>
    <div class="card">
      <h3>Health Check</h3>
      <p>Service and database connectivity status.</p>
      <a href="/health">GET /health</a>
    </div>
    <div class="card">
      <h3>Reporting Currency</h3>
      <p>Dashboard totals are converted with admin-maintained exchange rates. Amounts without a rate are counted as-is.</p>
    </div>
  </div>

  <div class="routes">
    <h4>Auth &amp; Users</h4>
    <div class="route"><span class="method">POST</span>/api/v1/auth/register</div>
    <div class="route"><span class="method">POST</span>/api/v1/auth/login</div>
    <div class="route"><span class="method">GET</span>/api/v1/auth/me</div>
    <div class="route"><span class="method">GET</span>/api/v1/users</div>
    <div class="route"><span class="method">PATCH</span>/api/v1/users/{id}/role</div>

    <h4>Settings</h4>
    <div class="route"><span class="method">*</span>/api/v1/departments</div>
    <div class="route"><span class="method">*</span>/api/v1/currencies</div>
    <div class="route"><span class="method">GET|PUT</span>/api/v1/settings/reporting-currency</div>
    <div class="route"><span class="method">GET|PUT</span>/api/v1/settings/exchange-rates</div>

    <h4>Employees &amp; Salary</h4>
    <div class="route"><span class="method">*</span>/api/v1/employees</div>
    <div class="route"><span class="method">POST</span>/api/v1/employees/{id}/deactivate</div>
    <div class="route"><span class="method">POST</span>/api/v1/employees/{id}/activate</div>
    <div class="route"><span class="method">*</span>/api/v1/salary</div>
    <div class="route"><span class="method">GET</span>/api/v1/salary/analysis</div>

    <h4>Expenses</h4>
    <div class="route"><span class="method">*</span>/api/v1/fixed-assets</div>
    <div class="route"><span class="method">*</span>/api/v1/expenses</div>

    <h4>Dashboard</h4>
    <div class="route"><span class="method">GET</span>/api/v1/dashboard/stats</div>
    <div class="route"><span class="method">GET</span>/api/v1/dashboard/payroll-by-month</div>
    <div class="route"><span class="method">GET</span>/api/v1/dashboard/payroll-and-expenses</div>
  </div>
</div>
</body>
</html>"#)
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "error": e.to_string()
            })),
        ),
    }
}
