//! Cross-cutting helpers shared by the review crates.

pub mod utils;
