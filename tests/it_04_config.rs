use credit_models::{Config, LogFormat};
use std::path::Path;

#[test]
fn shipped_config_binds_all_interfaces_on_8000() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
    let config: Config = Config::figment(&path).extract().unwrap();
    config.validate().unwrap();

    assert_eq!(config.server.bind, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.scoring.threshold, 0.5);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let config: Config = Config::figment(Path::new("does/not/exist.toml"))
        .extract()
        .unwrap();
    assert_eq!(config.server.bind, "0.0.0.0");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.model.path, "credit_risk_model.json");
}

fn dockerfile() -> String {
    std::fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join("Dockerfile")).unwrap()
}

#[test]
fn builder_toolchain_supports_current_dependencies() {
    let text = dockerfile();
    let image = text
        .lines()
        .find_map(|line| line.strip_prefix("FROM rust:"))
        .unwrap();
    let version = image.split('-').next().unwrap();
    let minor: u32 = version.split('.').nth(1).unwrap().parse().unwrap();
    assert!(minor >= 88, "builder toolchain {} is too old", version);
}

#[test]
fn image_serves_on_8000_with_a_mountable_model() {
    let text = dockerfile();
    assert!(text.contains("EXPOSE 8000"));
    assert!(text.contains("VOLUME /app/model"));
    assert!(text.contains("ENV CREDIT_MODEL__PATH=/app/model/credit_risk_model.json"));
    assert!(text.contains("COPY --from=builder /app/model ./model"));

    let ignored = std::fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join(".dockerignore"))
        .unwrap();
    assert!(!ignored.lines().any(|line| line.trim() == "credit_risk_model.json"));
}
