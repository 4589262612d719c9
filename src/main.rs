use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, warn};

mod catalog;
mod config;
mod db;
mod generation;
mod handlers;
mod models;
mod session;
mod state;
mod utils;

use config::CONFIG;
use db::{load_snapshot, Database, PersistQueue};
use generation::GeminiImageClient;
use session::Session;
use state::{AppState, Capabilities};
use utils::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let client = GeminiImageClient::from_config();
    info!("Starting aesthetic explorer (model {})", client.model());
    if CONFIG.gemini_api_key.trim().is_empty() {
        warn!("GEMINI_API_KEY is not set; generation requests will fail");
    }

    let db = Arc::new(Database::init(&CONFIG.database_url).await?);
    db.health_check().await?;

    let snapshot = load_snapshot(db.as_ref()).await;
    info!(
        "Loaded {} generation(s), {} preset(s), {} prompt(s)",
        snapshot.generations.len(),
        snapshot.presets.len(),
        snapshot.prompt_history.len()
    );
    let state = AppState::new(
        CONFIG.default_temperature,
        snapshot.generations,
        snapshot.presets,
        snapshot.prompt_history,
    );

    let (persist, writer) = PersistQueue::spawn(db.clone(), CONFIG.persist_queue_capacity);
    let mut session = Session::new(state, Capabilities::system(), Arc::new(client), persist);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = if args.is_empty() {
        session.run_interactive().await
    } else {
        session.run_once(&args.join(" ")).await
    };

    // Dropping the session closes the persistence queue so the writer drains and exits.
    drop(session);
    if let Err(err) = writer.await {
        warn!("Persistence writer ended abnormally: {}", err);
    }
    db.close().await;
    info!("Aesthetic explorer stopped");

    outcome
}
