// src/services/settings.rs
//
// Process-wide settings kept in the `app_settings` key/value table. Reads are
// fail-open: a missing or unreadable value behaves as "not configured".

use crate::{
    errors::{AppError, AppResult},
    services::currency::ExchangeRates,
};
use sqlx::{PgExecutor, PgPool};
use tracing::warn;
use uuid::Uuid;

const REPORTING_CURRENCY_KEY: &str = "reporting_currency_id";
const EXCHANGE_RATES_KEY: &str = "exchange_rates";

async fn read_value<'e>(db: impl PgExecutor<'e>, key: &str) -> AppResult<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
            .bind(key)
            .fetch_optional(db)
            .await?;
    Ok(value.flatten())
}

async fn write_value<'e>(db: impl PgExecutor<'e>, key: &str, value: Option<String>) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO app_settings (key, value, updated_at)
           VALUES ($1, $2, NOW())
           ON CONFLICT (key) DO UPDATE
           SET value = EXCLUDED.value,
               updated_at = NOW()"#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

pub fn parse_reporting_currency(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Ignoring malformed reporting currency setting {:?}", raw);
            None
        }
    }
}

pub fn parse_exchange_rates(raw: Option<&str>) -> ExchangeRates {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return ExchangeRates::new();
    };
    match serde_json::from_str::<ExchangeRates>(raw) {
        Ok(rates) => rates,
        Err(e) => {
            warn!("Ignoring malformed exchange rates setting: {}", e);
            ExchangeRates::new()
        }
    }
}

pub async fn reporting_currency_id(db: &PgPool) -> AppResult<Option<Uuid>> {
    let raw = read_value(db, REPORTING_CURRENCY_KEY).await?;
    Ok(parse_reporting_currency(raw.as_deref()))
}

pub async fn set_reporting_currency_id(db: &PgPool, currency_id: Option<Uuid>) -> AppResult<()> {
    write_value(db, REPORTING_CURRENCY_KEY, currency_id.map(|id| id.to_string())).await
}

pub async fn exchange_rates(db: &PgPool) -> AppResult<ExchangeRates> {
    let raw = read_value(db, EXCHANGE_RATES_KEY).await?;
    Ok(parse_exchange_rates(raw.as_deref()))
}

pub async fn set_exchange_rates(db: &PgPool, rates: &ExchangeRates) -> AppResult<()> {
    let json = serde_json::to_string(rates).map_err(|e| AppError::Internal(e.to_string()))?;
    write_value(db, EXCHANGE_RATES_KEY, Some(json)).await
}
