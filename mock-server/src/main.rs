use mock_server::{ServerConfig, DEFAULT_TOKEN};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let config = ServerConfig {
        token: std::env::var("KEYMANAGER_TOKEN").unwrap_or_else(|_| DEFAULT_TOKEN.to_string()),
        ..ServerConfig::default()
    };
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    mock_server::run_with_config(listener, config).await
}
