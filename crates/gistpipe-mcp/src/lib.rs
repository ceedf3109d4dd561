//! `gistpipe` crate (library surface).
//!
//! The primary entrypoint for end users is the `gistpipe` binary (CLI + MCP stdio).
//! This library module exists to support embedding without depending on the internal
//! crate layout.

pub use gistpipe_core as core;
pub use gistpipe_local as local;
