//! Best-effort replication of domain events to an external mirror.
//!
//! The in-memory store is authoritative; a mirror (a hosted document store, a
//! local snapshot file) only shadows it. Replication is asynchronous and
//! fallible; a mirror outage never blocks or fails a core operation.

use async_trait::async_trait;
use tracing::warn;

use crate::events::Event;

/// Replication target for committed domain events.
#[async_trait]
pub trait Mirror: Send + Sync {
    async fn replicate(&self, event: &Event) -> anyhow::Result<()>;
}

/// Mirror that drops everything; used when no external store is configured.
#[derive(Debug, Default)]
pub struct NoopMirror;

#[async_trait]
impl Mirror for NoopMirror {
    async fn replicate(&self, _event: &Event) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Attempts per event before giving up and logging.
const REPLICATION_ATTEMPTS: usize = 3;

/// Push one event to the mirror with bounded retry. Failures are logged and
/// swallowed; the authoritative state has already moved on.
pub async fn replicate_with_retry(mirror: &dyn Mirror, event: &Event) {
    for attempt in 1..=REPLICATION_ATTEMPTS {
        match mirror.replicate(event).await {
            Ok(()) => return,
            Err(e) if attempt == REPLICATION_ATTEMPTS => {
                warn!(error = %e, attempts = REPLICATION_ATTEMPTS, "mirror replication gave up");
            }
            Err(e) => {
                warn!(error = %e, attempt, "mirror replication failed; retrying");
            }
        }
    }
}
