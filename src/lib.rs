//! Client-side synchronization core for a quiz buzzer server.
//!
//! A [`ConnectionManager`] keeps one WebSocket open to the server, rebuilds a [`ClientState`]
//! snapshot from every inbound message and exposes typed commands. Ranking and scoring helpers
//! derive scoreboards from that snapshot.

pub mod config;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;

pub use config::ClientConfig;
pub use services::connection::{ConnectionManager, ConnectionStatus};
pub use state::ClientState;
