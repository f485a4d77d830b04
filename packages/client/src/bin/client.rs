//! ShadowPad command-line client with reconnection support.
//!
//! Connects to a ShadowPad server, creates or joins a room, and edits its
//! shared document line by line. Stored pads are encrypted and decrypted
//! locally with the room password; the server never sees the key.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval) and rejoins the last room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin shadowpad-client -- --name alice
//! cargo run --bin shadowpad-client -- -n bob -u ws://127.0.0.1:8080/ws
//! ```

use clap::Parser;

use shadowpad_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "shadowpad-client")]
#[command(about = "Command-line client for ShadowPad collaborative pads", long_about = None)]
struct Args {
    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    name: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// HTTP origin of the pad API (derived from --url when omitted)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = shadowpad_client::run_client(args.url, args.name, args.api_url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
