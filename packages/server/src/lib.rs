//! ShadowPad room server.
//!
//! Layers, from the inside out:
//!
//! - `domain`: rooms, participants, capabilities, host rules, storage traits
//! - `usecase`: one use case per protocol operation, plus the room registry
//! - `infrastructure`: in-memory repository, WebSocket pusher, pad stores, DTOs
//! - `ui`: axum router, WebSocket gateway and HTTP handlers

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
