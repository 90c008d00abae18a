use anyhow::Result;
use incident_monitor::config;
use incident_monitor::db::{seed, DatabaseService};
use log::{error, info};

async fn run() -> Result<()> {
    let config_path = config::config_path_from_env();
    let config = config::load_config(config_path.as_deref())?;

    info!("Connecting to database");

    // Seeding always needs the schema, whatever auto_migrate says.
    let database = DatabaseService::new(&config.database).await?;
    if !config.database.auto_migrate {
        database.run_migrations().await?;
    }

    let (cameras, incidents) = seed::seed_database(database.pool.clone()).await?;
    info!(
        "Database seeded successfully: {} cameras, {} incidents",
        cameras, incidents
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("Seeding failed: {:#}", e);
        std::process::exit(1);
    }
}
