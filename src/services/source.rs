// src/services/source.rs
//
// Read side of the aggregation endpoints. The dashboard and salary-analysis
// services only see this trait, so they can be driven from memory in tests.

use crate::{
    errors::AppResult,
    models::SalaryStatus,
    services::{currency::ExchangeRates, month::YearMonth, settings},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A salary record joined with the owning employee's currency.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryFact {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_code: Option<String>,
    pub month: YearMonth,
    pub net_salary: Decimal,
    pub currency_id: Option<Uuid>,
    pub status: SalaryStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFact {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetFact {
    pub cost: Decimal,
    pub currency_id: Option<Uuid>,
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Salary records for the months `from..=to`.
    async fn salary_records(&self, from: YearMonth, to: YearMonth) -> AppResult<Vec<SalaryFact>>;

    /// Day-to-day expenses dated in `from..until` (end exclusive).
    async fn day_to_day_expenses(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<ExpenseFact>>;

    async fn fixed_assets(&self, active_only: bool) -> AppResult<Vec<AssetFact>>;

    async fn reporting_currency_id(&self) -> AppResult<Option<Uuid>>;

    async fn exchange_rates(&self) -> AppResult<ExchangeRates>;
}

#[derive(Clone)]
pub struct PgReportSource {
    db: PgPool,
}

impl PgReportSource {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct SalaryFactRow {
    employee_id: Uuid,
    employee_name: String,
    employee_code: Option<String>,
    month: NaiveDate,
    net_salary: Decimal,
    currency_id: Option<Uuid>,
    status: SalaryStatus,
}

impl From<SalaryFactRow> for SalaryFact {
    fn from(row: SalaryFactRow) -> Self {
        SalaryFact {
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            employee_code: row.employee_code,
            month: YearMonth::from_date(row.month),
            net_salary: row.net_salary,
            currency_id: row.currency_id,
            status: row.status,
        }
    }
}

#[async_trait]
impl ReportSource for PgReportSource {
    async fn salary_records(&self, from: YearMonth, to: YearMonth) -> AppResult<Vec<SalaryFact>> {
        // `month <= to` works because months are stored as their first day.
        let rows = sqlx::query_as::<_, SalaryFactRow>(
            r#"SELECT s.employee_id,
                      e.full_name AS employee_name,
                      e.employee_code,
                      s.month,
                      s.net_salary,
                      e.currency_id,
                      s.status
               FROM salary_records s
               JOIN employees e ON e.id = s.employee_id
               WHERE s.month >= $1 AND s.month <= $2
               ORDER BY s.month ASC"#,
        )
        .bind(from.first_day())
        .bind(to.first_day())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(SalaryFact::from).collect())
    }

    async fn day_to_day_expenses(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> AppResult<Vec<ExpenseFact>> {
        let rows: Vec<(NaiveDate, Decimal, Option<Uuid>)> = sqlx::query_as(
            r#"SELECT date, amount, currency_id
               FROM day_to_day_expenses
               WHERE date >= $1 AND date < $2"#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, amount, currency_id)| ExpenseFact {
                date,
                amount,
                currency_id,
            })
            .collect())
    }

    async fn fixed_assets(&self, active_only: bool) -> AppResult<Vec<AssetFact>> {
        let rows: Vec<(Decimal, Option<Uuid>)> = sqlx::query_as(
            r#"SELECT cost, currency_id
               FROM fixed_assets
               WHERE NOT $1 OR status = 'active'"#,
        )
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(cost, currency_id)| AssetFact { cost, currency_id })
            .collect())
    }

    async fn reporting_currency_id(&self) -> AppResult<Option<Uuid>> {
        settings::reporting_currency_id(&self.db).await
    }

    async fn exchange_rates(&self) -> AppResult<ExchangeRates> {
        settings::exchange_rates(&self.db).await
    }
}
