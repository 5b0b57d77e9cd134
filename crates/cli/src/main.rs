use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use credit_models::{
    ErrorShape, Feature, HealthResponse, LoanApplication, PredictionResponse, StatusResponse,
};
use reqwest::{Client, Response};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "credit-cli")]
#[command(about = "Terminal client for the Credit Risk Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "http://localhost:8000")]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reference codes for the categorical fields
    Codes,
    /// Check that the server is up and has a model
    Health,
    /// Score a loan application
    Predict {
        /// Loan duration in months
        #[arg(long, default_value = "24")]
        duration: f64,
        /// Credit amount in DM
        #[arg(long, default_value = "5000")]
        credit_amount: f64,
        /// Applicant age in years
        #[arg(long, default_value = "30")]
        age: f64,
        /// Job code (see `codes`)
        #[arg(long, default_value = "1")]
        job: i64,
        /// Checking account status code
        #[arg(long, default_value = "1")]
        checking_status: i64,
        /// Savings account status code
        #[arg(long, default_value = "0")]
        savings_status: i64,
        /// Loan purpose code
        #[arg(long, default_value = "0")]
        purpose: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Green,
    Orange,
    Red,
}

impl Band {
    fn for_score(score: f64) -> Self {
        if score < 0.3 {
            Band::Green
        } else if score < 0.6 {
            Band::Orange
        } else {
            Band::Red
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Band::Green => "green",
            Band::Orange => "orange",
            Band::Red => "red",
        }
    }
}

/// Ten-cell bar for a score in `[0, 1]`.
fn gauge(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let endpoint = cli.endpoint.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Codes => show_codes(&client, &endpoint).await,
        Commands::Health => check_health(&client, &endpoint).await,
        Commands::Predict {
            duration,
            credit_amount,
            age,
            job,
            checking_status,
            savings_status,
            purpose,
        } => {
            let application = LoanApplication {
                duration,
                credit_amount,
                age,
                job,
                checking_status,
                savings_status,
                purpose,
            };
            predict(&client, &endpoint, &application).await
        }
    };

    if let Err(e) = result {
        if let Some(req) = e.downcast_ref::<reqwest::Error>() {
            if req.is_connect() || req.is_timeout() {
                eprintln!(
                    "❌ Could not reach {}. Is the server running? Start it with `credit-risk-server`.",
                    endpoint
                );
                std::process::exit(2);
            }
        }
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

/// Turns a non-2xx response into an error carrying the server's message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await?;
    let message = serde_json::from_str::<ErrorShape>(&text)
        .map(|shape| format!("{}: {}", shape.error_type, shape.error_message))
        .unwrap_or(text);
    error!(%status, "Request failed");
    Err(anyhow!("server returned {}: {}", status, message))
}

async fn show_codes(client: &Client, endpoint: &str) -> Result<()> {
    info!("Fetching reference codes");

    let response = check(client.get(format!("{endpoint}/")).send().await?).await?;
    let status: StatusResponse = response.json().await?;

    println!("📋 Reference codes (server {}):", status.status);
    for name in status.reference_codes.features() {
        let Some(codes) = Feature::from_name(name).and_then(|f| status.reference_codes.codes(f))
        else {
            continue;
        };
        println!("   {name}");
        for (code, description) in codes {
            println!("     {code:>2}  {description}");
        }
    }
    Ok(())
}

async fn check_health(client: &Client, endpoint: &str) -> Result<()> {
    info!("Checking health");

    let response = check(client.get(format!("{endpoint}/healthz")).send().await?).await?;
    let health: HealthResponse = response.json().await?;

    println!("🩺 Status: {}", health.status);
    if health.model_loaded {
        println!(
            "   Model: loaded ({})",
            health.model_version.as_deref().unwrap_or("unknown version")
        );
    } else {
        println!("   Model: not loaded, run `credit-risk-train` and restart the server");
    }
    Ok(())
}

async fn predict(client: &Client, endpoint: &str, application: &LoanApplication) -> Result<()> {
    info!(?application, "Requesting prediction");

    let response = check(
        client
            .post(format!("{endpoint}/predict"))
            .json(application)
            .send()
            .await?,
    )
    .await?;
    let prediction: PredictionResponse = response.json().await?;

    let score = prediction.risk_probability;
    let band = Band::for_score(score);
    let decision = serde_json::to_value(prediction.decision)?;
    let risk_class = serde_json::to_value(prediction.risk_class)?;

    println!("📤 Decision: {}", decision.as_str().unwrap_or_default());
    println!("   Risk score: {:.1}%", score * 100.0);
    println!("   Risk class: {}", risk_class.as_str().unwrap_or_default());
    println!("   Gauge: {} {}", gauge(score), band.label());
    println!(
        "   Applicant: {}, age {}",
        prediction.applicant_profile.job_type, prediction.applicant_profile.age
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_score_thresholds() {
        assert_eq!(Band::for_score(0.0), Band::Green);
        assert_eq!(Band::for_score(0.29), Band::Green);
        assert_eq!(Band::for_score(0.3), Band::Orange);
        assert_eq!(Band::for_score(0.59), Band::Orange);
        assert_eq!(Band::for_score(0.6), Band::Red);
        assert_eq!(Band::for_score(1.0), Band::Red);
    }

    #[test]
    fn gauge_fills_proportionally() {
        assert_eq!(gauge(0.0), "[..........]");
        assert_eq!(gauge(0.5), "[#####.....]");
        assert_eq!(gauge(1.0), "[##########]");
        assert_eq!(gauge(3.0), "[##########]");
    }

    #[test]
    fn predict_flags_parse() {
        let cli = Cli::try_parse_from([
            "credit-cli",
            "--endpoint",
            "http://127.0.0.1:9000",
            "predict",
            "--duration",
            "60",
            "--checking-status",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.endpoint, "http://127.0.0.1:9000");
        match cli.command {
            Commands::Predict {
                duration,
                checking_status,
                age,
                ..
            } => {
                assert_eq!(duration, 60.0);
                assert_eq!(checking_status, 3);
                assert_eq!(age, 30.0);
            }
            _ => panic!("expected predict"),
        }
    }
}
