// src/services/dashboard.rs

use crate::{
    errors::{AppError, AppResult},
    models::SalaryStatus,
    services::{
        currency::ConversionContext,
        month::{MonthBuckets, MonthTotal, ROLLING_WINDOW_MONTHS, YearMonth, rolling_window},
        source::{AssetFact, ExpenseFact, ReportSource, SalaryFact},
    },
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

/// Headline figures, all expressed in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Net payroll of the current month.
    pub total_monthly_payroll: Decimal,
    /// Current-month salary records still pending.
    pub pending_salaries_count: usize,
    /// Net payroll from January 1 through the end of the current month.
    pub annual_payroll_ytd: Decimal,
    pub expenses_this_month: Decimal,
    /// Cost of all active fixed assets, whatever their purchase date.
    pub fixed_assets_total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PayrollExpensePoint {
    #[schema(value_type = String, example = "2025-03")]
    pub month: YearMonth,
    pub label: String,
    pub payroll: Decimal,
    pub expenses: Decimal,
}

fn out_of_range(today: NaiveDate) -> AppError {
    AppError::BadRequest(format!("Date {} is outside the supported range", today))
}

fn month_bounds(month: YearMonth) -> Option<(NaiveDate, NaiveDate)> {
    Some((month.first_day(), month.next()?.first_day()))
}

pub fn compute_stats(
    today: NaiveDate,
    salaries: &[SalaryFact],
    expenses: &[ExpenseFact],
    assets: &[AssetFact],
    ctx: &mut ConversionContext,
) -> DashboardStats {
    let current = YearMonth::from_date(today);

    let mut total_monthly_payroll = Decimal::ZERO;
    let mut pending_salaries_count = 0;
    let mut annual_payroll_ytd = Decimal::ZERO;

    for record in salaries
        .iter()
        .filter(|r| r.month.year() == today.year() && r.month <= current)
    {
        let net = ctx.convert(record.net_salary, record.currency_id);
        annual_payroll_ytd = annual_payroll_ytd.saturating_add(net);
        if record.month == current {
            total_monthly_payroll = total_monthly_payroll.saturating_add(net);
            if record.status == SalaryStatus::Pending {
                pending_salaries_count += 1;
            }
        }
    }

    let expenses_this_month = expenses
        .iter()
        .filter(|e| YearMonth::from_date(e.date) == current)
        .map(|e| ctx.convert(e.amount, e.currency_id))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    let fixed_assets_total_value = assets
        .iter()
        .map(|a| ctx.convert(a.cost, a.currency_id))
        .fold(Decimal::ZERO, Decimal::saturating_add);

    DashboardStats {
        total_monthly_payroll,
        pending_salaries_count,
        annual_payroll_ytd,
        expenses_this_month,
        fixed_assets_total_value,
    }
}

/// Converted net payroll per month, zero-filled over `start..=end`.
pub fn payroll_buckets(
    start: YearMonth,
    end: YearMonth,
    salaries: &[SalaryFact],
    ctx: &mut ConversionContext,
) -> MonthBuckets {
    let mut buckets = MonthBuckets::new(start, end);
    for record in salaries {
        let net = ctx.convert(record.net_salary, record.currency_id);
        buckets.add(record.month, net);
    }
    buckets
}

pub fn expense_buckets(
    start: YearMonth,
    end: YearMonth,
    expenses: &[ExpenseFact],
    ctx: &mut ConversionContext,
) -> MonthBuckets {
    let mut buckets = MonthBuckets::new(start, end);
    for expense in expenses {
        let amount = ctx.convert(expense.amount, expense.currency_id);
        buckets.add(YearMonth::from_date(expense.date), amount);
    }
    buckets
}

pub fn merge_series(payroll: MonthBuckets, expenses: MonthBuckets) -> Vec<PayrollExpensePoint> {
    payroll
        .iter()
        .map(|(month, payroll)| PayrollExpensePoint {
            month,
            label: month.label(),
            payroll,
            expenses: expenses.get(month).unwrap_or(Decimal::ZERO),
        })
        .collect()
}

pub async fn dashboard_stats<S>(source: &S, today: NaiveDate) -> AppResult<DashboardStats>
where
    S: ReportSource + ?Sized,
{
    let current = YearMonth::from_date(today);
    let year_start = YearMonth::new(today.year(), 1).ok_or_else(|| out_of_range(today))?;
    let (month_start, month_end) = month_bounds(current).ok_or_else(|| out_of_range(today))?;

    let (salaries, expenses, assets, reporting, rates) = tokio::try_join!(
        source.salary_records(year_start, current),
        source.day_to_day_expenses(month_start, month_end),
        source.fixed_assets(true),
        source.reporting_currency_id(),
        source.exchange_rates(),
    )?;

    debug!(
        "Dashboard stats for {}: {} salary records, {} expenses, {} assets",
        current,
        salaries.len(),
        expenses.len(),
        assets.len()
    );

    let mut ctx = ConversionContext::new(reporting, rates);
    let stats = compute_stats(today, &salaries, &expenses, &assets, &mut ctx);
    ctx.report_missing_rates("dashboard stats");
    Ok(stats)
}

pub async fn payroll_by_month<S>(source: &S, today: NaiveDate) -> AppResult<Vec<MonthTotal>>
where
    S: ReportSource + ?Sized,
{
    let (start, end) =
        rolling_window(today, ROLLING_WINDOW_MONTHS).ok_or_else(|| out_of_range(today))?;

    let (salaries, reporting, rates) = tokio::try_join!(
        source.salary_records(start, end),
        source.reporting_currency_id(),
        source.exchange_rates(),
    )?;

    let mut ctx = ConversionContext::new(reporting, rates);
    let buckets = payroll_buckets(start, end, &salaries, &mut ctx);
    ctx.report_missing_rates("payroll by month");
    Ok(buckets.into_totals())
}

pub async fn payroll_and_expenses_by_month<S>(
    source: &S,
    today: NaiveDate,
) -> AppResult<Vec<PayrollExpensePoint>>
where
    S: ReportSource + ?Sized,
{
    let (start, end) =
        rolling_window(today, ROLLING_WINDOW_MONTHS).ok_or_else(|| out_of_range(today))?;
    let until = end.next().ok_or_else(|| out_of_range(today))?.first_day();

    let (salaries, expenses, reporting, rates) = tokio::try_join!(
        source.salary_records(start, end),
        source.day_to_day_expenses(start.first_day(), until),
        source.reporting_currency_id(),
        source.exchange_rates(),
    )?;

    let mut ctx = ConversionContext::new(reporting, rates);
    let payroll = payroll_buckets(start, end, &salaries, &mut ctx);
    let spent = expense_buckets(start, end, &expenses, &mut ctx);
    ctx.report_missing_rates("payroll and expenses by month");
    Ok(merge_series(payroll, spent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{currency::ExchangeRates, source::memory::MemorySource};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn salary(employee_id: Uuid, month: &str, net: Decimal, currency_id: Option<Uuid>) -> SalaryFact {
        SalaryFact {
            employee_id,
            employee_name: "Employee".to_string(),
            employee_code: None,
            month: month.parse().unwrap(),
            net_salary: net,
            currency_id,
            status: SalaryStatus::Paid,
        }
    }

    #[tokio::test]
    async fn converts_salary_into_reporting_currency() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let source = MemorySource {
            salaries: vec![salary(Uuid::new_v4(), "2025-06", dec!(1000), Some(eur))],
            reporting_currency_id: Some(usd),
            rates: ExchangeRates::new().with_rate(eur, dec!(1.1)),
            ..Default::default()
        };

        let series = payroll_by_month(&source, date(2025, 6, 15)).await.unwrap();
        assert_eq!(series.last().unwrap().total, dec!(1100));

        let stats = dashboard_stats(&source, date(2025, 6, 15)).await.unwrap();
        assert_eq!(stats.total_monthly_payroll, dec!(1100));
        assert_eq!(stats.annual_payroll_ytd, dec!(1100));
    }

    #[tokio::test]
    async fn without_reporting_currency_totals_are_raw_sums() {
        let eur = Uuid::new_v4();
        let pkr = Uuid::new_v4();
        let source = MemorySource {
            salaries: vec![
                salary(Uuid::new_v4(), "2025-06", dec!(1000), Some(eur)),
                salary(Uuid::new_v4(), "2025-06", dec!(250000), Some(pkr)),
                salary(Uuid::new_v4(), "2025-06", dec!(300), None),
            ],
            expenses: vec![ExpenseFact {
                date: date(2025, 6, 3),
                amount: dec!(40),
                currency_id: Some(eur),
            }],
            assets: vec![(AssetFact { cost: dec!(900), currency_id: Some(pkr) }, true)],
            rates: ExchangeRates::new().with_rate(eur, dec!(1.1)),
            ..Default::default()
        };

        let stats = dashboard_stats(&source, date(2025, 6, 30)).await.unwrap();
        assert_eq!(stats.total_monthly_payroll, dec!(251300));
        assert_eq!(stats.expenses_this_month, dec!(40));
        assert_eq!(stats.fixed_assets_total_value, dec!(900));
    }

    #[tokio::test]
    async fn empty_current_month_yields_zeros() {
        let source = MemorySource {
            salaries: vec![salary(Uuid::new_v4(), "2025-02", dec!(500), None)],
            ..Default::default()
        };

        let stats = dashboard_stats(&source, date(2025, 6, 1)).await.unwrap();
        assert_eq!(stats.total_monthly_payroll, Decimal::ZERO);
        assert_eq!(stats.pending_salaries_count, 0);
        assert_eq!(stats.expenses_this_month, Decimal::ZERO);
        assert_eq!(stats.annual_payroll_ytd, dec!(500));
    }

    #[test]
    fn stats_count_pending_only_in_current_month_and_ignore_prior_years() {
        let today = date(2025, 3, 10);
        let mut pending_now = salary(Uuid::new_v4(), "2025-03", dec!(100), None);
        pending_now.status = SalaryStatus::Pending;
        let mut pending_earlier = salary(Uuid::new_v4(), "2025-02", dec!(100), None);
        pending_earlier.status = SalaryStatus::Pending;
        let deferred_now = SalaryFact {
            status: SalaryStatus::Deferred,
            ..salary(Uuid::new_v4(), "2025-03", dec!(50), None)
        };
        let last_year = salary(Uuid::new_v4(), "2024-12", dec!(999), None);

        let mut ctx = ConversionContext::new(None, ExchangeRates::new());
        let stats = compute_stats(
            today,
            &[pending_now, pending_earlier, deferred_now, last_year],
            &[],
            &[],
            &mut ctx,
        );

        assert_eq!(stats.pending_salaries_count, 1);
        assert_eq!(stats.total_monthly_payroll, dec!(150));
        assert_eq!(stats.annual_payroll_ytd, dec!(250));
    }

    #[test]
    fn huge_totals_saturate_instead_of_panicking() {
        let today = date(2025, 3, 10);
        let salaries = [
            salary(Uuid::new_v4(), "2025-03", Decimal::MAX, None),
            salary(Uuid::new_v4(), "2025-03", Decimal::MAX, None),
        ];
        let assets = [
            AssetFact { cost: Decimal::MAX, currency_id: None },
            AssetFact { cost: Decimal::MAX, currency_id: None },
        ];

        let mut ctx = ConversionContext::new(None, ExchangeRates::new());
        let stats = compute_stats(today, &salaries, &[], &assets, &mut ctx);

        assert_eq!(stats.total_monthly_payroll, Decimal::MAX);
        assert_eq!(stats.annual_payroll_ytd, Decimal::MAX);
        assert_eq!(stats.fixed_assets_total_value, Decimal::MAX);
    }

    #[tokio::test]
    async fn retired_assets_are_excluded_from_total_value() {
        let source = MemorySource {
            assets: vec![
                (AssetFact { cost: dec!(1200), currency_id: None }, true),
                (AssetFact { cost: dec!(800), currency_id: None }, false),
            ],
            ..Default::default()
        };

        let stats = dashboard_stats(&source, date(2025, 1, 1)).await.unwrap();
        assert_eq!(stats.fixed_assets_total_value, dec!(1200));
    }

    #[tokio::test]
    async fn sparse_months_are_zero_filled() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // Window for 2025-06 is 2024-07 ..= 2025-06; months 1 and 3 are 2024-07 and 2024-09.
        let source = MemorySource {
            salaries: vec![
                salary(a, "2024-07", dec!(100), None),
                salary(b, "2024-07", dec!(200), None),
                salary(a, "2024-09", dec!(150), None),
                salary(b, "2024-09", dec!(50), None),
                salary(a, "2024-06", dec!(999), None),
            ],
            ..Default::default()
        };

        let series = payroll_by_month(&source, date(2025, 6, 20)).await.unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].month.to_string(), "2024-07");
        assert_eq!(series[0].total, dec!(300));
        assert_eq!(series[2].total, dec!(200));
        for (i, point) in series.iter().enumerate() {
            if i != 0 && i != 2 {
                assert_eq!(point.total, Decimal::ZERO, "month {}", point.month);
            }
        }
    }

    #[tokio::test]
    async fn combined_series_carries_both_sources() {
        let eur = Uuid::new_v4();
        let usd = Uuid::new_v4();
        let source = MemorySource {
            salaries: vec![salary(Uuid::new_v4(), "2025-05", dec!(1000), None)],
            expenses: vec![
                ExpenseFact { date: date(2025, 5, 2), amount: dec!(10), currency_id: Some(eur) },
                ExpenseFact { date: date(2025, 5, 31), amount: dec!(20), currency_id: Some(eur) },
                ExpenseFact { date: date(2024, 1, 1), amount: dec!(70), currency_id: Some(eur) },
            ],
            reporting_currency_id: Some(usd),
            rates: ExchangeRates::new().with_rate(eur, dec!(2)),
            ..Default::default()
        };

        let series = payroll_and_expenses_by_month(&source, date(2025, 6, 1)).await.unwrap();
        assert_eq!(series.len(), 12);
        let may = series.iter().find(|p| p.month.to_string() == "2025-05").unwrap();
        assert_eq!(may.payroll, dec!(1000));
        assert_eq!(may.expenses, dec!(60));
        assert_eq!(may.label, "May 2025");
        let total_expenses: Decimal = series.iter().map(|p| p.expenses).sum();
        assert_eq!(total_expenses, dec!(60));
    }

    #[tokio::test]
    async fn read_failure_fails_the_whole_panel() {
        let source = MemorySource { fail: true, ..Default::default() };
        let err = dashboard_stats(&source, date(2025, 1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
