//! ShadowPad command-line client.
//!
//! - `command`: parsing of prompt input
//! - `domain`: local room state folded from server messages
//! - `pad` / `pad_api`: client-side pad encryption and the pad HTTP API
//! - `session` / `runner`: one WebSocket connection, and reconnects around it

pub mod command;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod pad;
pub mod pad_api;
pub mod runner;
pub mod session;
pub mod ui;

pub use error::ClientError;
pub use runner::run_client;
