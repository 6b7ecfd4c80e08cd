//! Run cutoffs: caller cancellation and the retrieval deadline
//!
//! Both end a run the same way an exhausted attempt budget does. A
//! [`Cutoff`] wraps every service call made during retrieval, so a call
//! that is in flight when the token fires or the deadline passes is
//! abandoned rather than awaited.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct Signal {
    fired: AtomicBool,
    waiters: Notify,
}

/// Caller-side handle for stopping a run. Clones share one signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    signal: Arc<Signal>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.fired.load(Ordering::Acquire)
    }

    /// Fire the token. Idempotent; wakes every pending [`cancelled`](Self::cancelled).
    pub fn cancel(&self) {
        self.signal.fired.store(true, Ordering::Release);
        self.signal.waiters.notify_waiters();
    }

    /// Resolves once the token has fired.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a cancel between the two is not lost.
            let notified = self.signal.waiters.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// When a run must stop early: a token, an optional deadline, or both.
#[derive(Debug, Clone, Default)]
pub struct Cutoff {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cutoff {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn is_reached(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` until it finishes or the cutoff is reached.
    ///
    /// `None` means the call was skipped or abandoned. A result that is
    /// ready at the same moment as the cutoff still wins.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_reached() {
            return None;
        }
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = self.token.cancelled() => None,
            _ = expiry => None,
        }
    }
}
