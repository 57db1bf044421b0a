//! Storage abstractions for service layer
//!
//! Contains the ordered, optionally file-backed map that every store in this
//! crate persists through.

pub mod json_map_store;
