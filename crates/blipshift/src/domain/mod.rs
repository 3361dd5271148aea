//! Core domain types: documents, coordinate records, and errors.

pub mod document;
pub mod errors;
pub mod model;
