//! Review storage and query engine.
//! - `storage` holds the ordered, durable map every store persists through.
//! - `reviews` enforces the entity rules and implements the queries.
//! - `api` is the boundary: every call returns a `CallResult`.

pub mod api;
pub mod clock;
pub mod errors;
pub mod file;
pub mod ids;
pub mod metrics;
pub mod pagination;
pub mod reviews;
pub mod storage;
#[cfg(test)]
pub mod test_support;

pub use api::{CallResult, ReviewApi};
pub use reviews::service::ReviewService;
pub use reviews::store::ReviewStore;
