use anyhow::Result;
use incident_monitor::api::RestApi;
use incident_monitor::config;
use incident_monitor::services::create_incident_store;
use log::info;

async fn run_app() -> Result<()> {
    let config_path = config::config_path_from_env();
    let config = config::load_config(config_path.as_deref())?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting Incident Monitor");
    info!("Configuration loaded");

    let store = create_incident_store(&config).await?;

    let http_server = RestApi::new(&config.api, store);
    http_server.run().await?;

    info!("API server stopped");

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
