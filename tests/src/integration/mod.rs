//! Integration tests across the gate crates.

pub mod http;
pub mod pipeline;
