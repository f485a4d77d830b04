//! axum front end: router, WebSocket gateway and HTTP API.

mod error;
pub mod gateway;
mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ApiError;
pub use server::Server;
pub use state::AppState;
