//! ShadowPad room server.
//!
//! Hosts collaborative rooms over WebSocket and stores encrypted pads.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin shadowpad-server
//! cargo run --bin shadowpad-server -- --host 0.0.0.0 --port 3000 --data-dir ./pads
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use shadowpad_server::{
    domain::PadStore,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        pad_store::{DEFAULT_RETENTION_DAYS, FilePadStore, InMemoryPadStore},
        repository::InMemoryRoomRepository,
    },
    ui::{AppState, Server},
};
use shadowpad_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "shadowpad-server")]
#[command(about = "Collaborative pad server with encrypted persistence", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Directory for stored pads (kept in memory when omitted)
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Days of inactivity after which a stored pad expires
    #[arg(long, default_value_t = DEFAULT_RETENTION_DAYS)]
    retention_days: u64,

    /// Largest accepted attachment, in MiB
    #[arg(long, default_value_t = 25)]
    max_upload_mb: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let retention = Duration::from_secs(args.retention_days * 24 * 60 * 60);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. PadStore
    // 4. AppState (UseCases)
    // 5. Server

    // 1. Create Repository (in-memory room table)
    let repository = Arc::new(InMemoryRoomRepository::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create PadStore (file-backed when a data directory is given)
    let pad_store: Arc<dyn PadStore> = match &args.data_dir {
        Some(dir) => match FilePadStore::open(dir, clock.clone(), retention).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to open pad store at {}: {}", dir.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("No --data-dir given; pads are kept in memory only");
            Arc::new(InMemoryPadStore::new(clock.clone(), retention))
        }
    };
    tracing::info!("Pads expire after {} day(s) of inactivity", args.retention_days);

    // 4. Create UseCases
    let state = AppState::new(
        repository,
        message_pusher,
        pad_store,
        clock,
        args.max_upload_mb * 1024 * 1024,
    );

    // 5. Create and run the server
    if let Err(e) = Server::new(state).run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
