//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API request/response DTOs
//! - `conversion`: domain model → DTO

pub mod conversion;
pub mod http;
pub mod websocket;
