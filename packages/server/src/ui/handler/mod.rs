//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{delete_pad, get_room_detail, get_rooms, health_check, save_pad};
pub use websocket::websocket_handler;
