use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use credit_api::routes::build_router;
use credit_models::{Config, ErrorShape, HealthResponse, PredictionResponse, StatusResponse};
use credit_testsupport::{
    high_risk_application, low_risk_application, test_state, write_synthetic_model,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::util::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_lists_reference_codes_without_a_model() {
    let app = build_router(test_state(Config::default(), None).unwrap());

    let res = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let status: StatusResponse = body_json(res).await;
    assert_eq!(status.status, "online");
    let features: Vec<&str> = status.reference_codes.features().collect();
    assert_eq!(features, vec!["checking_status", "job", "purpose", "savings_status"]);
}

#[tokio::test]
async fn predict_without_model_is_a_server_error() {
    let app = build_router(test_state(Config::default(), None).unwrap());
    let body = serde_json::to_value(high_risk_application()).unwrap();

    let res = app.oneshot(post_json("/predict", &body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorShape = body_json(res).await;
    assert_eq!(error.error_message, "Model not loaded");
}

#[tokio::test]
async fn predict_scores_with_a_trained_model() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_synthetic_model(dir.path()).unwrap();
    let state = test_state(Config::default(), Some(&model)).unwrap();

    let high = serde_json::to_value(high_risk_application()).unwrap();
    let res = build_router(state.clone())
        .oneshot(post_json("/predict", &high))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let prediction: PredictionResponse = body_json(res).await;
    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(value["decision"], "DENY");
    assert_eq!(value["risk_class"], "High Risk");
    assert_eq!(value["applicant_profile"]["job_type"], "Skilled Employee");
    assert_eq!(value["applicant_profile"]["age"], 25.0);

    let low = serde_json::to_value(low_risk_application()).unwrap();
    let res = build_router(state)
        .oneshot(post_json("/predict", &low))
        .await
        .unwrap();
    let prediction: PredictionResponse = body_json(res).await;
    assert_eq!(serde_json::to_value(&prediction).unwrap()["decision"], "APPROVE");
    assert!((0.0..=0.5).contains(&prediction.risk_probability));
}

#[tokio::test]
async fn unknown_job_code_is_reported_as_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_synthetic_model(dir.path()).unwrap();
    let app = build_router(test_state(Config::default(), Some(&model)).unwrap());

    let mut application = low_risk_application();
    application.job = 42;
    let body = serde_json::to_value(application).unwrap();

    let res = app.oneshot(post_json("/predict", &body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let prediction: PredictionResponse = body_json(res).await;
    assert_eq!(prediction.applicant_profile.job_type, "Unknown");
}

#[tokio::test]
async fn malformed_application_is_unprocessable() {
    let app = build_router(test_state(Config::default(), None).unwrap());
    let body = json!({"duration": 12, "credit_amount": "lots", "age": 30});

    let res = app.oneshot(post_json("/predict", &body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorShape = body_json(res).await;
    assert_eq!(error.error_type, "ValidationError");
}

#[tokio::test]
async fn health_reports_model_state() {
    let app = build_router(test_state(Config::default(), None).unwrap());

    let res = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let health: HealthResponse = body_json(res).await;
    assert!(!health.model_loaded);
    assert_eq!(health.model_version, None);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = build_router(test_state(Config::default(), None).unwrap());

    let res = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("credit_model_loaded 0"));
}
