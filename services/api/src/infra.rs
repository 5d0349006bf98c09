use metrics_exporter_prometheus::PrometheusHandle;
use peer_tutor::assignments::{AssignmentService, SqliteRecordStore};
use peer_tutor::config::AppConfig;
use peer_tutor::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn open_store(config: &AppConfig) -> Result<Arc<SqliteRecordStore>, AppError> {
    let store = SqliteRecordStore::open(&config.store)?;
    Ok(Arc::new(store))
}

pub(crate) fn assignment_service(
    config: &AppConfig,
    store: Arc<SqliteRecordStore>,
) -> Arc<AssignmentService<SqliteRecordStore>> {
    Arc::new(AssignmentService::new(store, config.grades.clone()))
}
