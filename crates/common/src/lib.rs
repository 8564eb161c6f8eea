//! Shared chat-platform-agnostic types used across all herald crates.

pub mod types;
