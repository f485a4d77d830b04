//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::PurgeExpiredPadsUseCase;

use super::{
    handler::{delete_pad, get_room_detail, get_rooms, health_check, save_pad, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// How often expired pads are swept from the store.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// ShadowPad room server
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(repository, message_pusher, pad_store, clock, max_upload_bytes);
/// Server::new(state).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the router. Exposed for in-process tests.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/save-pad", post(save_pad))
            .route("/api/delete-pad", delete(delete_pad))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("ShadowPad server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let purge_task = tokio::spawn(purge_loop(
            self.state.purge_pads_usecase.clone(),
            PURGE_INTERVAL,
        ));
        let app = self.router();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        purge_task.abort();
        result
    }
}

async fn purge_loop(usecase: Arc<PurgeExpiredPadsUseCase>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        if let Err(e) = usecase.execute().await {
            tracing::warn!("Failed to purge expired pads: {}", e);
        }
    }
}
