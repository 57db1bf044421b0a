//! Entity definitions for the review store.

pub mod errors;
pub mod review;

pub use review::{Review, ReviewPayload, Timestamp};
