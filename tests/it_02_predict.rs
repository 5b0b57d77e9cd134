use credit_models::{Decision, RiskClass};
use credit_testsupport::*;

#[tokio::test(flavor = "multi_thread")]
async fn predictions_are_scored_and_counted() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let model = write_synthetic_model(dir.path())?;
    let server = spawn_server(Some(&model)).await?;
    let client = CreditClient::new(server.base_url.clone());

    let health = client.health().await?;
    assert!(health.model_loaded);
    assert_eq!(health.model_version.map(|v| v.len()), Some(12));

    let high = client.predict(&high_risk_application()).await?;
    assert_eq!(high.decision, Decision::Deny);
    assert_eq!(high.risk_class, RiskClass::High);
    assert_eq!(high.applicant_profile.job_type, "Skilled Employee");

    let low = client.predict(&low_risk_application()).await?;
    assert_eq!(low.decision, Decision::Approve);
    assert_eq!(low.risk_class, RiskClass::Low);
    assert!(low.risk_probability < high.risk_probability);

    let metrics = client.metrics().await?;
    assert!(metrics.contains("credit_predictions_total 2"));
    assert!(metrics.contains("credit_approvals_total 1"));
    assert!(metrics.contains("credit_denials_total 1"));
    assert!(metrics.contains("credit_model_loaded 1"));

    server.stop().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_predictions_are_stable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let model = write_synthetic_model(dir.path())?;
    let server = spawn_server(Some(&model)).await?;
    let client = CreditClient::new(server.base_url.clone());

    let first = client.predict(&high_risk_application()).await?;
    let second = client.predict(&high_risk_application()).await?;
    assert_eq!(first, second);

    server.stop().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn code_book_matches_the_loaded_model() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let model = write_synthetic_model(dir.path())?;
    let server = spawn_server(Some(&model)).await?;
    let client = CreditClient::new(server.base_url.clone());

    let status = client.status().await?;
    let codes = serde_json::to_value(&status.reference_codes)?;
    assert_eq!(codes["job"]["1"], "Skilled Employee");
    assert_eq!(codes["purpose"]["9"], "Used Car");
    assert_eq!(codes["savings_status"]["4"], "No Known Savings");

    server.stop().await?;
    Ok(())
}
