use condo_inspect::app::InspectionApp;
use condo_inspect::config::AppConfig;
use condo_inspect::report::{
    CommandRasterizer, CommandShareTarget, ReportExporter, ShareTarget, UnsupportedShareTarget,
};
use condo_inspect::store::FileStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Collaborators wired from configuration, shared by the server and console.
pub(crate) struct Wiring {
    pub(crate) app: InspectionApp,
    pub(crate) exporter: ReportExporter,
    pub(crate) share: Arc<dyn ShareTarget>,
}

pub(crate) fn wire(config: &AppConfig) -> Wiring {
    let store = Arc::new(FileStore::new(config.storage.data_dir.clone()));
    debug!(data_dir = %config.storage.data_dir.display(), "opening data directory");
    Wiring {
        app: InspectionApp::load(store, config.report.inspector.clone()),
        exporter: ReportExporter::new(Arc::new(CommandRasterizer::new(
            config.report.rasterizer.clone(),
        ))),
        share: share_target(config.report.share_command.as_deref()),
    }
}

pub(crate) fn share_target(command: Option<&str>) -> Arc<dyn ShareTarget> {
    match command {
        Some(program) => Arc::new(CommandShareTarget::new(program)),
        None => Arc::new(UnsupportedShareTarget),
    }
}
