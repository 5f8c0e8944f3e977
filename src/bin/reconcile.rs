//! Questline Reconciler - catalog reconciliation sweep
//!
//! Run after quest configuration changes to bring existing progress
//! documents in line with the new catalog.
//!
//! Usage:
//!   questline-reconcile --tenant acme
//!
//! Environment variables:
//!   MONGODB_URI - MongoDB connection URI (default: mongodb://localhost:27017)
//!   MONGODB_DB - Database name (default: questline)
//!   LOG_LEVEL - Log level (default: info)

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use questline::catalog::MongoCatalog;
use questline::config::Args as CommonArgs;
use questline::db::MongoClient;
use questline::store::MongoProgressStore;
use questline::CatalogReconciler;

#[derive(Parser, Debug)]
#[command(name = "questline-reconcile")]
#[command(about = "Reconcile stored quest progress against the current catalog")]
#[command(version)]
struct Args {
    /// Tenant to reconcile
    #[arg(long, env = "TENANT_ID")]
    tenant: String,

    /// Shared service configuration
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.common.log_level.clone();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("questline={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.common.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let run_id = uuid::Uuid::new_v4();
    info!("Starting reconciliation sweep {} for tenant {}", run_id, args.tenant);

    let mongo = MongoClient::new(&args.common.mongodb_uri, &args.common.mongodb_db).await?;
    let store = Arc::new(MongoProgressStore::new(&mongo).await?);
    let catalog = Arc::new(MongoCatalog::new(&mongo).await?);

    let reconciler = CatalogReconciler::new(store, catalog);
    let report = reconciler.sweep(&args.tenant).await?;

    info!("Sweep {} report: {}", run_id, serde_json::to_string(&report)?);

    Ok(())
}
