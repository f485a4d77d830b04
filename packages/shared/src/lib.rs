//! Code shared by the ShadowPad server and client.
//!
//! - `cipher`: forward-secure pad encryption (client-local key material)
//! - `logger`: tracing subscriber setup
//! - `time`: clock abstraction and timestamp helpers

pub mod cipher;
pub mod logger;
pub mod time;
