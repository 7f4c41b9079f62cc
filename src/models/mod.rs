// src/models/mod.rs

use crate::services::month::YearMonth;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Distinguishes "field absent" (`None`) from "field explicitly null"
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ─── Users & Roles ────────────────────────────────────────────────────────────

// sqlx 0.8: custom Postgres enums need #[sqlx(type_name = "...")] on the enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Finance,
    Viewer,
}

impl UserRole {
    /// Admins and finance staff may create and edit payroll and expense rows.
    pub fn can_edit_records(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Finance)
    }

    /// Only admins manage settings, reference data and user roles.
    pub fn can_manage_settings(self) -> bool {
        self == UserRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetUserRoleRequest {
    pub role: UserRole,
}

// ─── Departments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepartmentRequest {
    pub name: String,
}

// ─── Currencies ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Currency {
    pub id: Uuid,
    pub code: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCurrencyRequest {
    pub code: String,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCurrencyRequest {
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
}

// ─── Settings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportingCurrencySetting {
    /// `null` disables conversion.
    pub currency_id: Option<Uuid>,
}

// ─── Employee ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "employee_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    /// Staff number shown next to the name, e.g. `EMP-014`.
    pub employee_code: Option<String>,
    pub department_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub email: String,
    pub monthly_salary: Decimal,
    pub joining_date: NaiveDate,
    pub payment_method_notes: Option<String>,
    pub status: EmployeeStatus,
    pub country: String,
    pub city: String,
    pub currency_id: Option<Uuid>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee with its department and currency resolved for display.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EmployeeDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    pub department_name: Option<String>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub full_name: String,
    pub employee_code: Option<String>,
    pub department_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub email: String,
    pub monthly_salary: Decimal,
    pub joining_date: NaiveDate,
    pub payment_method_notes: Option<String>,
    pub status: Option<EmployeeStatus>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    pub currency_id: Option<Uuid>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub employee_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub department_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub job_title: Option<Option<String>>,
    pub email: Option<String>,
    pub monthly_salary: Option<Decimal>,
    pub joining_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub payment_method_notes: Option<Option<String>>,
    pub status: Option<EmployeeStatus>,
    pub country: Option<String>,
    pub city: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub currency_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilters {
    pub department_id: Option<Uuid>,
    pub status: Option<EmployeeStatus>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub currency_id: Option<Uuid>,
}

// ─── Salary Records ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "salary_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SalaryStatus {
    Pending,
    Paid,
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SalaryRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    /// First day of the payroll month.
    pub month: NaiveDate,
    pub base_salary: Decimal,
    pub deductions: Decimal,
    pub bonus: Decimal,
    /// Computed by the database: base + bonus - deductions.
    pub net_salary: Decimal,
    pub status: SalaryStatus,
    pub payment_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalaryRecordDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: SalaryRecord,
    pub employee_name: String,
    pub employee_code: Option<String>,
    pub currency_id: Option<Uuid>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSalaryRecordRequest {
    pub employee_id: Uuid,
    /// `YYYY-MM`, or any date inside the month.
    #[schema(value_type = String, example = "2025-03")]
    pub month: YearMonth,
    pub base_salary: Decimal,
    pub deductions: Option<Decimal>,
    pub bonus: Option<Decimal>,
    pub status: Option<SalaryStatus>,
    pub payment_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub receipt_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSalaryRecordRequest {
    pub base_salary: Option<Decimal>,
    pub deductions: Option<Decimal>,
    pub bonus: Option<Decimal>,
    pub status: Option<SalaryStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub comments: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub receipt_url: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalaryFilters {
    /// `YYYY-MM`
    #[param(value_type = Option<String>)]
    pub month: Option<YearMonth>,
    pub employee_id: Option<Uuid>,
    pub status: Option<SalaryStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalysisQuery {
    /// Calendar year to analyse; defaults to the current year.
    pub year: Option<i32>,
    /// Overrides "today" (`YYYY-MM-DD`).
    pub as_of: Option<NaiveDate>,
}

// ─── Fixed Assets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "asset_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Laptop,
    Server,
    Phone,
    Furniture,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "asset_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FixedAsset {
    pub id: Uuid,
    pub asset_name: String,
    pub asset_type: AssetType,
    pub purchase_date: NaiveDate,
    pub cost: Decimal,
    pub currency_id: Option<Uuid>,
    pub assigned_employee_id: Option<Uuid>,
    pub depreciation_rate: Option<Decimal>,
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FixedAssetDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub asset: FixedAsset,
    pub assigned_employee_name: Option<String>,
    pub assigned_employee_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFixedAssetRequest {
    pub asset_name: String,
    pub asset_type: AssetType,
    pub purchase_date: NaiveDate,
    pub cost: Decimal,
    pub currency_id: Option<Uuid>,
    pub assigned_employee_id: Option<Uuid>,
    pub depreciation_rate: Option<Decimal>,
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateFixedAssetRequest {
    pub asset_name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub purchase_date: Option<NaiveDate>,
    pub cost: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub currency_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub assigned_employee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub depreciation_rate: Option<Option<Decimal>>,
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FixedAssetFilters {
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
}

// ─── Day-to-day Expenses ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "expense_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Utilities,
    Internet,
    Rent,
    Software,
    Travel,
    Pantry,
    Marketing,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "expense_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpensePaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DayToDayExpense {
    pub id: Uuid,
    pub category: ExpenseCategory,
    pub vendor: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency_id: Option<Uuid>,
    pub payment_status: ExpensePaymentStatus,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDayToDayExpenseRequest {
    pub category: ExpenseCategory,
    pub vendor: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency_id: Option<Uuid>,
    pub payment_status: Option<ExpensePaymentStatus>,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDayToDayExpenseRequest {
    pub category: Option<ExpenseCategory>,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub currency_id: Option<Option<Uuid>>,
    pub payment_status: Option<ExpensePaymentStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub receipt_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayToDayExpenseFilters {
    pub category: Option<ExpenseCategory>,
    pub payment_status: Option<ExpensePaymentStatus>,
    /// `YYYY-MM`
    #[param(value_type = Option<String>)]
    pub month: Option<YearMonth>,
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AsOfQuery {
    /// Overrides "today" (`YYYY-MM-DD`); defaults to the current UTC date.
    pub as_of: Option<NaiveDate>,
}

// ─── JWT Claims ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}
