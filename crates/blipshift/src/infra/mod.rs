//! Infrastructure adapters for configuration and XML IO.

pub mod config;
pub mod xml;
