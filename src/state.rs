use crate::{config::Config, services::source::PgReportSource};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Read side used by the dashboard and salary-analysis endpoints.
    pub fn report_source(&self) -> PgReportSource {
        PgReportSource::new(self.db.clone())
    }
}
