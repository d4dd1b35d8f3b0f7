use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use clinic_booking::config;
use clinic_booking::db::{self, NewSlot};

#[derive(Debug, Parser)]
#[command(about = "Seed availability-slot definitions from a YAML file.")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to a YAML list of slot definitions
    #[arg(long)]
    slots: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/clinic.db", cfg.app.data_dir));
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let content = std::fs::read_to_string(&args.slots)
        .with_context(|| format!("failed to read {}", args.slots.display()))?;
    let slots: Vec<NewSlot> =
        serde_yaml::from_str(&content).context("slots file is not a YAML list of slots")?;

    let mut created = 0usize;
    for (idx, slot) in slots.iter().enumerate() {
        slot.validate()
            .with_context(|| format!("slot #{} is invalid", idx + 1))?;
        let stored = db::create_slot(&pool, slot).await?;
        println!(
            "created slot {} ({}{})",
            stored.id,
            stored.slot_id(),
            if stored.is_recurring {
                format!(", weekly on day {}", stored.day_of_week.unwrap_or_default())
            } else {
                String::new()
            }
        );
        created += 1;
    }
    println!("seeded {created} slot(s)");
    Ok(())
}
