// src/services/analysis.rs

use crate::{
    errors::{AppError, AppResult},
    models::SalaryStatus,
    services::{
        currency::ConversionContext,
        month::{MonthBuckets, MonthTotal, YearMonth},
        source::{ReportSource, SalaryFact},
    },
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub pending: usize,
    pub paid: usize,
    pub deferred: usize,
}

impl StatusCounts {
    fn record(&mut self, status: SalaryStatus) {
        match status {
            SalaryStatus::Pending => self.pending += 1,
            SalaryStatus::Paid => self.paid += 1,
            SalaryStatus::Deferred => self.deferred += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmployeeYtd {
    pub employee_id: Uuid,
    pub name: String,
    pub employee_code: Option<String>,
    pub ytd: Decimal,
    /// January through December of the analysed year.
    pub monthly_breakdown: Vec<MonthTotal>,
    pub pending_count: usize,
    pub paid_count: usize,
    pub deferred_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalaryAnalysis {
    pub year: i32,
    /// Sorted by YTD, largest first.
    pub employees: Vec<EmployeeYtd>,
    pub months: Vec<MonthTotal>,
    pub total_payroll: Decimal,
    pub status_counts: StatusCounts,
    pub highest_month: Option<MonthTotal>,
    pub lowest_month: Option<MonthTotal>,
    pub average_per_employee: Decimal,
    pub unique_employees: usize,
}

struct EmployeeAccumulator {
    name: String,
    employee_code: Option<String>,
    ytd: Decimal,
    monthly: MonthBuckets,
    counts: StatusCounts,
}

/// The months covered by an analysis of `year` as seen on `today`: the whole
/// year for past years, January through the current month for this year.
/// `None` for years that have not started.
pub fn analysis_period(year: i32, today: NaiveDate) -> Option<(YearMonth, YearMonth)> {
    let start = YearMonth::new(year, 1)?;
    let end = if year == today.year() {
        YearMonth::from_date(today)
    } else if year < today.year() {
        YearMonth::new(year, 12)?
    } else {
        return None;
    };
    Some((start, end))
}

/// Highest and lowest months with a positive total. Ties go to the earliest month.
pub fn month_extremes(months: &[MonthTotal]) -> (Option<MonthTotal>, Option<MonthTotal>) {
    let mut highest: Option<&MonthTotal> = None;
    let mut lowest: Option<&MonthTotal> = None;

    for month in months.iter().filter(|m| m.total > Decimal::ZERO) {
        if highest.is_none_or(|h| month.total > h.total) {
            highest = Some(month);
        }
        if lowest.is_none_or(|l| month.total < l.total) {
            lowest = Some(month);
        }
    }

    (highest.cloned(), lowest.cloned())
}

pub fn compute_analysis(
    year: i32,
    records: &[SalaryFact],
    ctx: &mut ConversionContext,
) -> SalaryAnalysis {
    let year_months = YearMonth::months_of_year(year);
    let mut company = MonthBuckets::from_months(year_months.iter().copied());
    let mut by_employee: HashMap<Uuid, EmployeeAccumulator> = HashMap::new();
    let mut total_payroll = Decimal::ZERO;
    let mut status_counts = StatusCounts::default();

    for record in records.iter().filter(|r| r.month.year() == year) {
        let net = ctx.convert(record.net_salary, record.currency_id);

        total_payroll = total_payroll.saturating_add(net);
        company.add(record.month, net);
        status_counts.record(record.status);

        let emp = by_employee
            .entry(record.employee_id)
            .or_insert_with(|| EmployeeAccumulator {
                name: record.employee_name.clone(),
                employee_code: record.employee_code.clone(),
                ytd: Decimal::ZERO,
                monthly: MonthBuckets::from_months(year_months.iter().copied()),
                counts: StatusCounts::default(),
            });
        emp.ytd = emp.ytd.saturating_add(net);
        emp.monthly.add(record.month, net);
        emp.counts.record(record.status);
    }

    let unique_employees = by_employee.len();
    let average_per_employee = if unique_employees > 0 {
        total_payroll / Decimal::from(unique_employees)
    } else {
        Decimal::ZERO
    };

    let mut employees: Vec<EmployeeYtd> = by_employee
        .into_iter()
        .map(|(employee_id, acc)| EmployeeYtd {
            employee_id,
            name: acc.name,
            employee_code: acc.employee_code,
            ytd: acc.ytd,
            monthly_breakdown: acc.monthly.into_totals(),
            pending_count: acc.counts.pending,
            paid_count: acc.counts.paid,
            deferred_count: acc.counts.deferred,
        })
        .collect();
    employees.sort_by(|a, b| {
        b.ytd
            .cmp(&a.ytd)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });

    let months = company.into_totals();
    let (highest_month, lowest_month) = month_extremes(&months);

    SalaryAnalysis {
        year,
        employees,
        months,
        total_payroll,
        status_counts,
        highest_month,
        lowest_month,
        average_per_employee,
        unique_employees,
    }
}

pub async fn salary_analysis<S>(source: &S, year: i32, today: NaiveDate) -> AppResult<SalaryAnalysis>
where
    S: ReportSource + ?Sized,
{
    if YearMonth::new(year, 1).is_none() {
        return Err(AppError::BadRequest(format!("Year {} is out of range", year)));
    }
    let Some((start, end)) = analysis_period(year, today) else {
        let mut ctx = ConversionContext::new(None, Default::default());
        return Ok(compute_analysis(year, &[], &mut ctx));
    };

    let (records, reporting, rates) = tokio::try_join!(
        source.salary_records(start, end),
        source.reporting_currency_id(),
        source.exchange_rates(),
    )?;

    let mut ctx = ConversionContext::new(reporting, rates);
    let analysis = compute_analysis(year, &records, &mut ctx);
    ctx.report_missing_rates("salary analysis");
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{currency::ExchangeRates, source::memory::MemorySource};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn record(
        employee_id: Uuid,
        name: &str,
        month: &str,
        net: Decimal,
        status: SalaryStatus,
    ) -> SalaryFact {
        SalaryFact {
            employee_id,
            employee_name: name.to_string(),
            employee_code: None,
            month: month.parse().unwrap(),
            net_salary: net,
            currency_id: None,
            status,
        }
    }

    fn plain_ctx() -> ConversionContext {
        ConversionContext::new(None, ExchangeRates::new())
    }

    #[test]
    fn builds_per_employee_breakdown_and_counts() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let records = vec![
            record(alice, "Alice", "2025-01", dec!(1000), SalaryStatus::Paid),
            record(alice, "Alice", "2025-02", dec!(1000), SalaryStatus::Pending),
            record(bob, "Bob", "2025-02", dec!(3000), SalaryStatus::Deferred),
        ];

        let analysis = compute_analysis(2025, &records, &mut plain_ctx());

        assert_eq!(analysis.unique_employees, 2);
        assert_eq!(analysis.total_payroll, dec!(5000));
        assert_eq!(analysis.average_per_employee, dec!(2500));
        assert_eq!(analysis.status_counts, StatusCounts { pending: 1, paid: 1, deferred: 1 });
        assert_eq!(analysis.months.len(), 12);
        assert_eq!(analysis.months[1].total, dec!(4000));

        let top = &analysis.employees[0];
        assert_eq!(top.name, "Bob");
        assert_eq!(top.deferred_count, 1);

        let alice_row = &analysis.employees[1];
        assert_eq!(alice_row.ytd, dec!(2000));
        assert_eq!(alice_row.monthly_breakdown.len(), 12);
        assert_eq!(alice_row.monthly_breakdown[0].total, dec!(1000));
        assert_eq!(alice_row.monthly_breakdown[2].total, Decimal::ZERO);
        assert_eq!((alice_row.paid_count, alice_row.pending_count), (1, 1));
    }

    #[test]
    fn extremes_skip_zero_months_and_prefer_earliest_on_ties() {
        let a = Uuid::new_v4();
        let records = vec![
            record(a, "A", "2025-02", dec!(500), SalaryStatus::Paid),
            record(a, "A", "2025-04", dec!(900), SalaryStatus::Paid),
            record(a, "A", "2025-06", dec!(900), SalaryStatus::Paid),
            record(a, "A", "2025-08", dec!(500), SalaryStatus::Paid),
        ];

        let analysis = compute_analysis(2025, &records, &mut plain_ctx());
        assert_eq!(analysis.highest_month.unwrap().month.to_string(), "2025-04");
        assert_eq!(analysis.lowest_month.unwrap().month.to_string(), "2025-02");
    }

    #[test]
    fn lowest_month_ignores_negative_totals() {
        let a = Uuid::new_v4();
        let records = vec![
            record(a, "A", "2025-01", dec!(-200), SalaryStatus::Paid),
            record(a, "A", "2025-03", dec!(700), SalaryStatus::Paid),
            record(a, "A", "2025-05", dec!(300), SalaryStatus::Paid),
        ];

        let analysis = compute_analysis(2025, &records, &mut plain_ctx());
        assert_eq!(analysis.highest_month.unwrap().month.to_string(), "2025-03");
        assert_eq!(analysis.lowest_month.unwrap().month.to_string(), "2025-05");
    }

    #[test]
    fn year_of_only_negative_months_has_no_extremes() {
        let a = Uuid::new_v4();
        let records = vec![record(a, "A", "2025-02", dec!(-50), SalaryStatus::Paid)];

        let analysis = compute_analysis(2025, &records, &mut plain_ctx());
        assert_eq!(analysis.highest_month, None);
        assert_eq!(analysis.lowest_month, None);
    }

    #[test]
    fn huge_salaries_saturate_totals() {
        let a = Uuid::new_v4();
        let records = vec![
            record(a, "A", "2025-01", Decimal::MAX, SalaryStatus::Paid),
            record(a, "A", "2025-01", Decimal::MAX, SalaryStatus::Paid),
        ];

        let analysis = compute_analysis(2025, &records, &mut plain_ctx());
        assert_eq!(analysis.total_payroll, Decimal::MAX);
        assert_eq!(analysis.employees[0].ytd, Decimal::MAX);
        assert_eq!(analysis.months[0].total, Decimal::MAX);
    }

    #[test]
    fn empty_year_has_no_extremes_and_zero_average() {
        let analysis = compute_analysis(2025, &[], &mut plain_ctx());
        assert!(analysis.employees.is_empty());
        assert_eq!(analysis.highest_month, None);
        assert_eq!(analysis.lowest_month, None);
        assert_eq!(analysis.average_per_employee, Decimal::ZERO);
        assert_eq!(analysis.months.len(), 12);
    }

    #[test]
    fn period_depends_on_year() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let (start, end) = analysis_period(2025, today).unwrap();
        assert_eq!((start.to_string(), end.to_string()), ("2025-01".into(), "2025-05".into()));

        let (_, end) = analysis_period(2024, today).unwrap();
        assert_eq!(end.to_string(), "2024-12");

        assert!(analysis_period(2026, today).is_none());
    }

    #[tokio::test]
    async fn analysis_converts_employee_currency() {
        let (usd, eur) = (Uuid::new_v4(), Uuid::new_v4());
        let mut fact = record(Uuid::new_v4(), "Eva", "2025-03", dec!(1000), SalaryStatus::Paid);
        fact.currency_id = Some(eur);
        let source = MemorySource {
            salaries: vec![fact],
            reporting_currency_id: Some(usd),
            rates: ExchangeRates::new().with_rate(eur, dec!(1.1)),
            ..Default::default()
        };

        let today = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let analysis = salary_analysis(&source, 2025, today).await.unwrap();
        assert_eq!(analysis.total_payroll, dec!(1100));
        assert_eq!(analysis.employees[0].ytd, dec!(1100));
    }

    #[tokio::test]
    async fn future_year_is_empty_not_an_error() {
        let source = MemorySource::default();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let analysis = salary_analysis(&source, 2030, today).await.unwrap();
        assert_eq!(analysis.total_payroll, Decimal::ZERO);
        assert_eq!(analysis.months.len(), 12);
    }

    fn status_strategy() -> impl Strategy<Value = SalaryStatus> {
        prop_oneof![
            Just(SalaryStatus::Pending),
            Just(SalaryStatus::Paid),
            Just(SalaryStatus::Deferred),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn employee_ytd_sums_to_company_total(
            rows in prop::collection::vec(
                (0usize..5, 1u32..=12, -50_000i64..500_000, status_strategy(), 0usize..3),
                0..40,
            ),
            rate in 1i64..300,
        ) {
            let employees: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
            let currencies: Vec<Option<Uuid>> = vec![None, Some(Uuid::new_v4()), Some(Uuid::new_v4())];
            let reporting = currencies[2];
            let rates = ExchangeRates::new().with_rate(currencies[1].unwrap(), Decimal::new(rate, 2));

            let records: Vec<SalaryFact> = rows
                .iter()
                .map(|(emp, month, cents, status, cur)| SalaryFact {
                    employee_id: employees[*emp],
                    employee_name: format!("E{emp}"),
                    employee_code: None,
                    month: YearMonth::new(2024, *month).unwrap(),
                    net_salary: Decimal::new(*cents, 2),
                    currency_id: currencies[*cur],
                    status: *status,
                })
                .collect();

            let mut ctx = ConversionContext::new(reporting, rates);
            let analysis = compute_analysis(2024, &records, &mut ctx);

            let ytd_sum: Decimal = analysis.employees.iter().map(|e| e.ytd).sum();
            prop_assert_eq!(ytd_sum, analysis.total_payroll);

            let month_sum: Decimal = analysis.months.iter().map(|m| m.total).sum();
            prop_assert_eq!(month_sum, analysis.total_payroll);

            let counted = analysis.status_counts.pending
                + analysis.status_counts.paid
                + analysis.status_counts.deferred;
            prop_assert_eq!(counted, records.len());
        }
    }
}
