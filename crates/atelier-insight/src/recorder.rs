//! Detached feedback recording
//!
//! Every approval, revision, and modification feeds the interaction memory
//! store. Recording is never part of the primary transaction: a write here
//! can lag, retry, or fail without the caller noticing.

use atelier_core::fail_open::fail_open_with_retries;
use atelier_core::InteractionRecord;
use atelier_store::MemoryStore;
use std::sync::Arc;

const MEMORY_WRITE_RETRIES: usize = 3;

#[derive(Clone)]
pub struct FeedbackRecorder {
    memory: Arc<dyn MemoryStore>,
}

impl FeedbackRecorder {
    pub fn new(memory: Arc<dyn MemoryStore>) -> Self {
        Self { memory }
    }

    /// Fire-and-forget: spawns the write and returns immediately
    pub fn record_detached(&self, record: InteractionRecord) {
        let memory = self.memory.clone();
        tokio::spawn(async move {
            fail_open_with_retries(
                "interaction_memory",
                || memory.record_interaction(record.clone()),
                MEMORY_WRITE_RETRIES,
            )
            .await;
        });
    }

    /// Awaitable best-effort write; returns whether the record landed
    pub async fn record(&self, record: InteractionRecord) -> bool {
        fail_open_with_retries(
            "interaction_memory",
            || self.memory.record_interaction(record.clone()),
            MEMORY_WRITE_RETRIES,
        )
        .await
        .is_some()
    }
}
