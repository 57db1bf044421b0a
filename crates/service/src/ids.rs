//! Review identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random version-4 UUIDs in hyphenated form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Ids;

impl IdGenerator for UuidV4Ids {
    fn next_id(&self) -> String { Uuid::new_v4().to_string() }
}

/// `<prefix>-00000001`, `<prefix>-00000002`, ... Zero padding keeps key order
/// equal to generation order.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), next: AtomicU64::new(1) }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n:08}", self.prefix)
    }
}
