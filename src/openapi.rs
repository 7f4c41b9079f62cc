// src/openapi.rs

use crate::{
    models::{
        AssetStatus, AssetType, AuthResponse, CreateCurrencyRequest, CreateDayToDayExpenseRequest,
        CreateEmployeeRequest, CreateFixedAssetRequest, CreateSalaryRecordRequest, Currency,
        DayToDayExpense, Department, DepartmentRequest, Employee, EmployeeDetail, EmployeeStatus,
        ExpenseCategory, ExpensePaymentStatus, FixedAsset, FixedAssetDetail, LoginRequest,
        RegisterRequest, ReportingCurrencySetting, SalaryRecord, SalaryRecordDetail, SalaryStatus,
        SetUserRoleRequest, UpdateCurrencyRequest, UpdateDayToDayExpenseRequest,
        UpdateEmployeeRequest, UpdateFixedAssetRequest, UpdateSalaryRecordRequest, UserProfile,
        UserRole,
    },
    services::{
        analysis::{EmployeeYtd, SalaryAnalysis, StatusCounts},
        currency::ExchangeRates,
        dashboard::{DashboardStats, PayrollExpensePoint},
        month::MonthTotal,
    },
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Dashboard API",
        version = "1.0.0",
        description = "Payroll and office-expense management. Tracks employees, monthly \
            salary records, fixed assets and day-to-day expenses, and reports dashboard \
            totals normalized into a single reporting currency.",
        license(name = "MIT")
    ),
    paths(
        // Auth & Users
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::auth::list_users,
        crate::handlers::auth::set_user_role,
        // Settings
        crate::handlers::settings::list_departments,
        crate::handlers::settings::get_department,
        crate::handlers::settings::create_department,
        crate::handlers::settings::update_department,
        crate::handlers::settings::delete_department,
        crate::handlers::settings::list_currencies,
        crate::handlers::settings::get_currency,
        crate::handlers::settings::create_currency,
        crate::handlers::settings::update_currency,
        crate::handlers::settings::delete_currency,
        crate::handlers::settings::get_reporting_currency,
        crate::handlers::settings::set_reporting_currency,
        crate::handlers::settings::get_exchange_rates,
        crate::handlers::settings::set_exchange_rates,
        // Employees
        crate::handlers::employee::create_employee,
        crate::handlers::employee::list_employees,
        crate::handlers::employee::get_employee,
        crate::handlers::employee::update_employee,
        crate::handlers::employee::deactivate_employee,
        crate::handlers::employee::activate_employee,
        // Salary
        crate::handlers::salary::list_salary_records,
        crate::handlers::salary::get_salary_record,
        crate::handlers::salary::create_salary_record,
        crate::handlers::salary::update_salary_record,
        crate::handlers::salary::salary_analysis,
        // Expenses
        crate::handlers::expenses::list_fixed_assets,
        crate::handlers::expenses::create_fixed_asset,
        crate::handlers::expenses::update_fixed_asset,
        crate::handlers::expenses::delete_fixed_asset,
        crate::handlers::expenses::list_expenses,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        // Dashboard
        crate::handlers::dashboard::stats,
        crate::handlers::dashboard::payroll_by_month,
        crate::handlers::dashboard::payroll_and_expenses,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, UserProfile, UserRole, SetUserRoleRequest,
            Department, DepartmentRequest,
            Currency, CreateCurrencyRequest, UpdateCurrencyRequest,
            ReportingCurrencySetting, ExchangeRates,
            Employee, EmployeeDetail, EmployeeStatus, CreateEmployeeRequest, UpdateEmployeeRequest,
            SalaryRecord, SalaryRecordDetail, SalaryStatus,
            CreateSalaryRecordRequest, UpdateSalaryRecordRequest,
            SalaryAnalysis, EmployeeYtd, StatusCounts,
            FixedAsset, FixedAssetDetail, AssetType, AssetStatus,
            CreateFixedAssetRequest, UpdateFixedAssetRequest,
            DayToDayExpense, ExpenseCategory, ExpensePaymentStatus,
            CreateDayToDayExpenseRequest, UpdateDayToDayExpenseRequest,
            DashboardStats, MonthTotal, PayrollExpensePoint,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Register, log in and manage user roles"),
        (name = "Settings", description = "Departments, currencies, reporting currency and exchange rates"),
        (name = "Employees", description = "Onboard and manage employees"),
        (name = "Salary", description = "Monthly salary records and yearly analysis"),
        (name = "Expenses", description = "Fixed assets and day-to-day office expenses"),
        (name = "Dashboard", description = "Aggregates in the reporting currency"),
    )
)]
pub struct ApiDoc;
