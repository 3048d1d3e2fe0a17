//! Single in-flight refresh shared by concurrent callers
//!
//! Without coordination, two requests that both see an invalid credential
//! each call the refresh endpoint, and the second refresh may race the first
//! one's write to the store. [`SingleFlightSession`] serialises refreshes
//! behind one lock and lets callers that queued behind a running refresh
//! reuse its outcome.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::traits::SessionFlow;

/// Session flow wrapper that deduplicates concurrent refreshes
///
/// A refresh that starts while another is running waits for it and returns
/// its result instead of issuing a second one. A refresh that starts after
/// the previous one finished always runs. Logout passes straight through.
pub struct SingleFlightSession<S> {
    inner: S,
    gate: Mutex<()>,
    generation: AtomicU64,
    last_outcome: AtomicBool,
}

impl<S: SessionFlow> SingleFlightSession<S> {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            last_outcome: AtomicBool::new(false),
        }
    }

    /// The wrapped session flow
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of refreshes actually executed
    #[cfg(test)]
    fn completed_refreshes(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[async_trait]
impl<S: SessionFlow> SessionFlow for SingleFlightSession<S> {
    async fn refresh(&self) -> bool {
        let observed = self.generation.load(Ordering::Acquire);
        let _guard = self.gate.lock().await;

        // Another caller finished a refresh while we were queued
        if self.generation.load(Ordering::Acquire) != observed {
            let outcome = self.last_outcome.load(Ordering::Acquire);
            debug!(outcome, "Joined in-flight credential refresh");
            return outcome;
        }

        let outcome = self.inner.refresh().await;
        self.last_outcome.store(outcome, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn logout(&self) {
        self.inner.logout().await;
    }
}
