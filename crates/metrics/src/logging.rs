use credit_models::{Decision, LogFormat, RiskError};
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` overrides the default `info` level.
    pub fn init(format: LogFormat) -> Result<(), RiskError> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(UtcTime::rfc_3339());

        let result = match format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };
        result.map_err(|e| RiskError::InternalError {
            reason: e.to_string(),
        })
    }

    pub fn log_server_started(addr: SocketAddr, model_loaded: bool) {
        info!(
            address = %addr,
            model_loaded = model_loaded,
            "Credit risk API listening"
        );
    }

    pub fn log_prediction(decision: Decision, raw: f64, calibrated: f64, duration_ms: f64) {
        info!(
            decision = ?decision,
            raw_probability = raw,
            risk_probability = calibrated,
            duration_ms = duration_ms,
            "Prediction served"
        );
    }

    pub fn log_prediction_failed(error: &RiskError) {
        match error {
            RiskError::InvalidApplication { .. } => warn!(
                error_type = error.error_type(),
                error_message = %error,
                "Prediction rejected"
            ),
            _ => error!(
                error_type = error.error_type(),
                error_message = %error,
                "Prediction failed"
            ),
        }
    }
}
