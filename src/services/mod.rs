/// Typed outbound commands and roster edit builders.
pub mod commands;
/// Connection lifecycle, reconnect and heartbeat.
pub mod connection;
/// Competition ranking for scoreboards.
pub mod ranking;
/// Single-slot timers with clear-before-set semantics.
pub mod scheduler;
/// Memory and multiple-choice point calculators.
pub mod scoring;
/// Socket abstraction and its WebSocket implementation.
pub mod transport;
