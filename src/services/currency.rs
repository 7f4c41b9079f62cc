// src/services/currency.rs
//
// Conversion of native amounts into the configured reporting currency.
// Conversion is fail-open: when the reporting currency or a rate is missing,
// or the product would overflow, the amount passes through unconverted.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

/// Largest rate accepted when saving exchange rates.
pub const MAX_EXCHANGE_RATE: Decimal = dec!(1000000);

/// `currency id -> rate`, where 1 unit of the currency equals `rate` units of
/// the reporting currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ExchangeRates(HashMap<Uuid, Decimal>);

impl ExchangeRates {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_rate(mut self, currency_id: Uuid, rate: Decimal) -> Self {
        self.0.insert(currency_id, rate);
        self
    }

    pub fn get(&self, currency_id: &Uuid) -> Option<Decimal> {
        self.0.get(currency_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops entries that can never apply: the reporting currency itself and
    /// non-positive rates.
    pub fn cleaned(self, reporting_currency_id: Option<Uuid>) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|(id, rate)| Some(*id) != reporting_currency_id && *rate > Decimal::ZERO)
                .collect(),
        )
    }

    pub fn has_negative_rate(&self) -> bool {
        self.0.values().any(|rate| *rate < Decimal::ZERO)
    }

    pub fn has_rate_above_max(&self) -> bool {
        self.0.values().any(|rate| *rate > MAX_EXCHANGE_RATE)
    }
}

/// Which rule decided a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    NoReportingCurrency,
    UnknownSource,
    SameCurrency,
    /// Rate absent or not positive; the amount is passed through.
    MissingRate,
    Converted(Decimal),
}

impl Conversion {
    /// `None` when `amount * rate` does not fit in a `Decimal`.
    pub fn apply(self, amount: Decimal) -> Option<Decimal> {
        match self {
            Conversion::Converted(rate) => amount.checked_mul(rate),
            _ => Some(amount),
        }
    }
}

pub fn resolve(
    source: Option<Uuid>,
    reporting: Option<Uuid>,
    rates: &ExchangeRates,
) -> Conversion {
    let Some(reporting) = reporting else {
        return Conversion::NoReportingCurrency;
    };
    let Some(source) = source else {
        return Conversion::UnknownSource;
    };
    if source == reporting {
        return Conversion::SameCurrency;
    }
    match rates.get(&source) {
        Some(rate) if rate > Decimal::ZERO => Conversion::Converted(rate),
        _ => Conversion::MissingRate,
    }
}

/// Normalizes `amount` from `source` into the reporting currency.
/// Never fails: an overflowing product passes `amount` through.
pub fn convert(
    amount: Decimal,
    source: Option<Uuid>,
    reporting: Option<Uuid>,
    rates: &ExchangeRates,
) -> Decimal {
    resolve(source, reporting, rates)
        .apply(amount)
        .unwrap_or(amount)
}

/// Reporting currency and rates for one request, plus a record of the
/// currencies that had to be passed through unconverted.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    reporting_currency_id: Option<Uuid>,
    rates: ExchangeRates,
    missing_rates: BTreeSet<Uuid>,
    overflowed: BTreeSet<Uuid>,
}

impl ConversionContext {
    pub fn new(reporting_currency_id: Option<Uuid>, rates: ExchangeRates) -> Self {
        Self {
            reporting_currency_id,
            rates,
            missing_rates: BTreeSet::new(),
            overflowed: BTreeSet::new(),
        }
    }

    pub fn resolve(&self, source: Option<Uuid>) -> Conversion {
        resolve(source, self.reporting_currency_id, &self.rates)
    }

    pub fn convert(&mut self, amount: Decimal, source: Option<Uuid>) -> Decimal {
        let outcome = self.resolve(source);
        match (outcome, source) {
            (Conversion::MissingRate, Some(id)) => {
                self.missing_rates.insert(id);
            }
            (Conversion::Converted(_), Some(id)) if outcome.apply(amount).is_none() => {
                self.overflowed.insert(id);
            }
            _ => {}
        }
        convert(amount, source, self.reporting_currency_id, &self.rates)
    }

    #[cfg(test)]
    pub fn missing_rates(&self) -> impl Iterator<Item = &Uuid> {
        self.missing_rates.iter()
    }

    #[cfg(test)]
    pub fn overflowed(&self) -> impl Iterator<Item = &Uuid> {
        self.overflowed.iter()
    }

    /// Logs the pass-through currencies once, if there were any.
    pub fn report_missing_rates(&self, what: &str) {
        if !self.missing_rates.is_empty() {
            warn!(
                "{}: no exchange rate for {} currencies {:?}; amounts included unconverted",
                what,
                self.missing_rates.len(),
                self.missing_rates
            );
        }
        if !self.overflowed.is_empty() {
            warn!(
                "{}: conversion overflowed for currencies {:?}; amounts included unconverted",
                what, self.overflowed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (-1_000_000_00i64..1_000_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    #[test]
    fn converts_with_positive_rate() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let rates = ExchangeRates::new().with_rate(eur, dec!(1.1));

        assert_eq!(convert(dec!(1000), Some(eur), Some(usd), &rates), dec!(1100));
        assert_eq!(resolve(Some(eur), Some(usd), &rates), Conversion::Converted(dec!(1.1)));
    }

    #[test]
    fn passes_through_without_reporting_currency() {
        let eur = Uuid::new_v4();
        let rates = ExchangeRates::new().with_rate(eur, dec!(1.1));

        assert_eq!(resolve(Some(eur), None, &rates), Conversion::NoReportingCurrency);
        assert_eq!(convert(dec!(1000), Some(eur), None, &rates), dec!(1000));
    }

    #[test]
    fn passes_through_unknown_source() {
        let usd = Uuid::new_v4();
        assert_eq!(resolve(None, Some(usd), &ExchangeRates::new()), Conversion::UnknownSource);
        assert_eq!(convert(dec!(42), None, Some(usd), &ExchangeRates::new()), dec!(42));
    }

    #[test]
    fn zero_and_negative_rates_count_as_missing() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let gbp = Uuid::new_v4();
        let rates = ExchangeRates::new()
            .with_rate(eur, Decimal::ZERO)
            .with_rate(gbp, dec!(-2));

        assert_eq!(resolve(Some(eur), Some(usd), &rates), Conversion::MissingRate);
        assert_eq!(resolve(Some(gbp), Some(usd), &rates), Conversion::MissingRate);
        assert_eq!(convert(dec!(10), Some(gbp), Some(usd), &rates), dec!(10));
    }

    #[test]
    fn context_records_missing_rates() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let pkr = Uuid::new_v4();
        let mut ctx = ConversionContext::new(Some(usd), ExchangeRates::new().with_rate(eur, dec!(2)));

        assert_eq!(ctx.convert(dec!(5), Some(eur)), dec!(10));
        assert_eq!(ctx.convert(dec!(5), Some(pkr)), dec!(5));
        assert_eq!(ctx.convert(dec!(5), Some(pkr)), dec!(5));
        assert_eq!(ctx.missing_rates().collect::<Vec<_>>(), vec![&pkr]);
    }

    #[test]
    fn overflowing_product_passes_through() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let largest = dec!(999999999999.99);
        let huge_rate = Decimal::from_i128_with_scale(100_000_000_000_000_000, 0);
        let rates = ExchangeRates::new().with_rate(eur, huge_rate);

        assert_eq!(Conversion::Converted(huge_rate).apply(largest), None);
        assert_eq!(convert(largest, Some(eur), Some(usd), &rates), largest);

        let mut ctx = ConversionContext::new(Some(usd), rates);
        assert_eq!(ctx.convert(largest, Some(eur)), largest);
        assert_eq!(ctx.overflowed().collect::<Vec<_>>(), vec![&eur]);
        assert_eq!(ctx.missing_rates().count(), 0);
    }

    #[test]
    fn rates_above_the_maximum_are_flagged() {
        let eur = Uuid::new_v4();
        assert!(!ExchangeRates::new().with_rate(eur, MAX_EXCHANGE_RATE).has_rate_above_max());
        assert!(
            ExchangeRates::new()
                .with_rate(eur, MAX_EXCHANGE_RATE + dec!(0.01))
                .has_rate_above_max()
        );
    }

    #[test]
    fn cleaning_drops_reporting_currency_and_non_positive_rates() {
        let usd = Uuid::new_v4();
        let eur = Uuid::new_v4();
        let aed = Uuid::new_v4();
        let rates = ExchangeRates::new()
            .with_rate(usd, dec!(1))
            .with_rate(eur, dec!(1.1))
            .with_rate(aed, Decimal::ZERO)
            .cleaned(Some(usd));

        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get(&eur), Some(dec!(1.1)));
    }

    #[test]
    fn rates_round_trip_as_plain_json_object() {
        let eur = Uuid::new_v4();
        let rates = ExchangeRates::new().with_rate(eur, dec!(1.1));
        let json = serde_json::to_value(&rates).unwrap();
        assert_eq!(json[eur.to_string()], serde_json::json!("1.1"));

        let parsed: ExchangeRates =
            serde_json::from_str(&format!(r#"{{"{eur}": 0.25}}"#)).unwrap();
        assert_eq!(parsed.get(&eur), Some(dec!(0.25)));
    }

    proptest! {
        #[test]
        fn same_currency_is_identity(amount in amount_strategy(), rate in 1i64..10_000) {
            let c = Uuid::new_v4();
            let rates = ExchangeRates::new().with_rate(c, Decimal::new(rate, 2));
            prop_assert_eq!(convert(amount, Some(c), Some(c), &rates), amount);
        }

        #[test]
        fn missing_or_non_positive_rate_is_pass_through(
            amount in amount_strategy(),
            rate in prop_oneof![Just(None), (-10_000i64..=0).prop_map(|r| Some(Decimal::new(r, 2)))],
        ) {
            let (src, reporting) = (Uuid::new_v4(), Uuid::new_v4());
            let rates = match rate {
                Some(r) => ExchangeRates::new().with_rate(src, r),
                None => ExchangeRates::new(),
            };
            prop_assert_eq!(convert(amount, Some(src), Some(reporting), &rates), amount);
        }

        #[test]
        fn positive_rate_multiplies(amount in amount_strategy(), rate in 1i64..1_000_000) {
            let (src, reporting) = (Uuid::new_v4(), Uuid::new_v4());
            let r = Decimal::new(rate, 4);
            let rates = ExchangeRates::new().with_rate(src, r);
            prop_assert_eq!(convert(amount, Some(src), Some(reporting), &rates), amount * r);
        }

        #[test]
        fn largest_amount_at_max_rate_converts(rate in 1i64..=1_000_000) {
            let (src, reporting) = (Uuid::new_v4(), Uuid::new_v4());
            let amount = dec!(999999999999.99);
            let r = Decimal::from(rate);
            let rates = ExchangeRates::new().with_rate(src, r);
            prop_assert_eq!(convert(amount, Some(src), Some(reporting), &rates), amount * r);
        }
    }
}
