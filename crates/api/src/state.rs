use credit_metrics::MetricsService;
use credit_models::Config;
use credit_pipeline::RiskEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<RiskEngine>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Config, engine: Arc<RiskEngine>, metrics: Arc<MetricsService>) -> Self {
        metrics.set_model_loaded(engine.is_loaded());
        Self {
            config,
            engine,
            metrics,
        }
    }
}
