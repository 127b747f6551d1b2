use flywheel::api::server;
use flywheel::config::AppConfig;
use flywheel::service::BuybackService;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    // Initialize logger (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    let service = Arc::new(BuybackService::new(config)?);

    let addr = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    log::info!("Starting buyback-burn service on {}", addr);
    server::start_server(&addr, service).await?;
    Ok(())
}
