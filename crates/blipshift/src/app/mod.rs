//! Application layer orchestrating domain logic and infrastructure.

pub mod combine;
pub mod discovery;
pub mod extract;
pub mod materialize;
pub mod offset;
pub mod session;
pub mod workspace;
