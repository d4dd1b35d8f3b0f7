use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use clinic_booking::{api, config, db};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/clinic.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    let schema = db::detect_schema(&pool).await?;
    info!(?schema, "availability slot schema detected");

    let state = api::AppState {
        pool,
        schema,
        clinic_name: cfg.clinic.name.clone(),
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr).await?;
    info!(addr = %cfg.server.bind_addr, "starting clinic booking api");
    axum::serve(listener, app).await?;

    Ok(())
}
