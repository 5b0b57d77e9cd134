use credit_models::{Decision, RiskError};
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder};

pub struct MetricsService {
    registry: Registry,
    predictions_total: Counter,
    approvals_total: Counter,
    denials_total: Counter,
    errors_total: Counter,
    risk_score: Histogram,
    duration_ms: Histogram,
    model_loaded: Gauge,
}

fn internal(e: prometheus::Error) -> RiskError {
    RiskError::InternalError {
        reason: e.to_string(),
    }
}

impl MetricsService {
    pub fn new() -> Result<Self, RiskError> {
        let registry = Registry::new();

        let predictions_total = Counter::new(
            "credit_predictions_total",
            "Total number of scored loan applications",
        )
        .map_err(internal)?;

        let approvals_total = Counter::new(
            "credit_approvals_total",
            "Total number of approved loan applications",
        )
        .map_err(internal)?;

        let denials_total = Counter::new(
            "credit_denials_total",
            "Total number of denied loan applications",
        )
        .map_err(internal)?;

        let errors_total = Counter::new(
            "credit_prediction_errors_total",
            "Total number of failed prediction requests",
        )
        .map_err(internal)?;

        let risk_score = Histogram::with_opts(
            HistogramOpts::new("credit_risk_score", "Calibrated risk score of scored applications")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )
        .map_err(internal)?;

        let duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "credit_prediction_duration_ms",
                "Model inference duration in milliseconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )
        .map_err(internal)?;

        let model_loaded = Gauge::new(
            "credit_model_loaded",
            "1 when a trained model is loaded, 0 otherwise",
        )
        .map_err(internal)?;

        registry
            .register(Box::new(predictions_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(approvals_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(denials_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(errors_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(risk_score.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(duration_ms.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(model_loaded.clone()))
            .map_err(internal)?;

        Ok(Self {
            registry,
            predictions_total,
            approvals_total,
            denials_total,
            errors_total,
            risk_score,
            duration_ms,
            model_loaded,
        })
    }

    pub fn record_prediction(&self, decision: Decision, risk_score: f64, duration_ms: f64) {
        self.predictions_total.inc();
        match decision {
            Decision::Approve => self.approvals_total.inc(),
            Decision::Deny => self.denials_total.inc(),
        }
        self.risk_score.observe(risk_score);
        self.duration_ms.observe(duration_ms);
    }

    pub fn record_error(&self) {
        self.errors_total.inc();
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.set(if loaded { 1.0 } else { 0.0 });
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, RiskError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(internal)?;

        String::from_utf8(buffer).map_err(|e| RiskError::InternalError {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name_registration() {
        let service = MetricsService::new().unwrap();
        let metrics_text = service.render().unwrap();

        let expected_metrics = [
            "credit_predictions_total",
            "credit_approvals_total",
            "credit_denials_total",
            "credit_prediction_errors_total",
            "credit_risk_score",
            "credit_prediction_duration_ms",
            "credit_model_loaded",
        ];

        for metric in &expected_metrics {
            assert!(metrics_text.contains(metric), "Missing metric: {}", metric);
        }
    }

    #[test]
    fn test_decisions_are_counted_separately() {
        let service = MetricsService::new().unwrap();
        service.record_prediction(Decision::Deny, 0.9, 1.2);
        service.record_prediction(Decision::Approve, 0.1, 0.8);
        service.record_prediction(Decision::Approve, 0.2, 0.7);
        service.record_error();
        service.set_model_loaded(true);

        let text = service.render().unwrap();
        assert!(text.contains("credit_predictions_total 3"));
        assert!(text.contains("credit_approvals_total 2"));
        assert!(text.contains("credit_denials_total 1"));
        assert!(text.contains("credit_prediction_errors_total 1"));
        assert!(text.contains("credit_model_loaded 1"));
        assert!(text.contains("credit_risk_score_count 3"));
    }
}
