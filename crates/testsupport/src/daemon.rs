use anyhow::Result;
use axum::{routing::get, Router};
use credit_api::AppState;
use credit_metrics::MetricsService;
use credit_models::Config;
use credit_pipeline::RiskEngine;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// The API served in-process on an ephemeral localhost port.
#[derive(Debug)]
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestServer {
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await?
    }
}

pub fn test_state(config: Config, model_path: Option<&Path>) -> Result<AppState> {
    let engine = match model_path {
        Some(path) => RiskEngine::load_or_empty(path, config.scoring),
        None => RiskEngine::new(None, config.scoring),
    };
    Ok(AppState::new(
        config,
        Arc::new(engine),
        Arc::new(MetricsService::new()?),
    ))
}

pub async fn spawn_server(model_path: Option<&Path>) -> Result<TestServer> {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;
    spawn_server_with(config, model_path).await
}

pub async fn spawn_server_with(config: Config, model_path: Option<&Path>) -> Result<TestServer> {
    let listener = TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;
    let state = test_state(config, model_path)?;

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        credit_api::serve(listener, state, async move {
            let _ = rx.await;
        })
        .await
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        addr,
        shutdown: Some(tx),
        handle,
    })
}

/// Serves `body` at `GET /<name>` on an ephemeral port and returns its URL.
/// Stands in for the dataset host so downloads run offline.
pub async fn serve_document(name: &str, body: String) -> Result<(String, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route(&format!("/{}", name), get(move || async move { body }));

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{}/{}", addr, name), handle))
}
