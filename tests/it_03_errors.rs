use credit_models::{Config, ErrorShape};
use credit_testsupport::*;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn predict_without_model_reports_model_not_loaded() -> anyhow::Result<()> {
    let server = spawn_server(None).await?;
    let client = CreditClient::new(server.base_url.clone());

    let response = client
        .predict_raw(&serde_json::to_value(low_risk_application())?)
        .await?;
    assert_eq!(response.status().as_u16(), 500);
    let error: ErrorShape = response.json().await?;
    assert_eq!(error.error_message, "Model not loaded");
    assert_eq!(error.error_type, "ModelUnavailable");

    server.stop().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_bodies_are_rejected_and_counted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let model = write_synthetic_model(dir.path())?;
    let server = spawn_server(Some(&model)).await?;
    let client = CreditClient::new(server.base_url.clone());

    let missing_field = json!({
        "duration": 12,
        "credit_amount": 1000,
        "age": 30,
        "job": 1,
        "checking_status": 1,
        "savings_status": 1
    });
    let response = client.predict_raw(&missing_field).await?;
    assert_eq!(response.status().as_u16(), 422);
    let error: ErrorShape = response.json().await?;
    assert_eq!(error.error_type, "ValidationError");

    let wrong_type = json!({
        "duration": "long",
        "credit_amount": 1000,
        "age": 30,
        "job": 1,
        "checking_status": 1,
        "savings_status": 1,
        "purpose": 0
    });
    let response = client.predict_raw(&wrong_type).await?;
    assert_eq!(response.status().as_u16(), 422);

    let metrics = client.metrics().await?;
    assert!(metrics.contains("credit_prediction_errors_total 2"));
    assert!(metrics.contains("credit_predictions_total 0"));

    server.stop().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_bodies_are_refused() -> anyhow::Result<()> {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.max_request_body_size_kb = 1;
    let server = spawn_server_with(config, None).await?;
    let client = CreditClient::new(server.base_url.clone());

    let padding = "x".repeat(4096);
    let response = client
        .predict_raw(&json!({ "duration": 12, "padding": padding }))
        .await?;
    assert!(response.status().is_client_error());

    server.stop().await?;
    Ok(())
}
