use anyhow::Result;
use credit_models::{HealthResponse, LoanApplication, PredictionResponse, StatusResponse};
use reqwest::{Client, Response};

pub struct CreditClient {
    client: Client,
    base_url: String,
}

impl CreditClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self.client.get(format!("{}/", self.base_url)).send().await?;
        Ok(ensure_success(response, "Status").await?.json().await?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;
        Ok(ensure_success(response, "Health").await?.json().await?)
    }

    pub async fn predict(&self, application: &LoanApplication) -> Result<PredictionResponse> {
        let response = self.predict_raw(&serde_json::to_value(application)?).await?;
        Ok(ensure_success(response, "Predict").await?.json().await?)
    }

    /// Posts an arbitrary body so tests can inspect error responses.
    pub async fn predict_raw(&self, body: &serde_json::Value) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(body)
            .send()
            .await?)
    }

    pub async fn metrics(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?;
        Ok(ensure_success(response, "Metrics").await?.text().await?)
    }
}

async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await?;
        anyhow::bail!("{} failed ({}): {}", operation, status, error_text);
    }
    Ok(response)
}
