// src/exec/context.rs

//! Cancellation context for process execution.
//!
//! A [`Context`] is handed to a [`DefaultExecer`](super::DefaultExecer) at
//! construction. It can be cancelled explicitly through a [`CancelHandle`],
//! expire at a deadline, or both. The executor checks it before spawning and
//! races it against every running child; there are no internal timeouts.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::errors::CancelReason;

/// Caller-supplied cancellation context.
///
/// Cloning is cheap and clones observe the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Handle that cancels the [`Context`] it was created with.
///
/// Dropping the handle does *not* cancel the context.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Context {
    /// A context that is never done.
    pub fn background() -> Self {
        Self::default()
    }

    /// A fresh context together with the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            deadline: None,
        };
        (ctx, CancelHandle { tx })
    }

    /// Expire at `deadline`, or earlier if a sooner deadline is already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<CancelReason> {
        if let Some(rx) = &self.cancel {
            if *rx.borrow() {
                return Some(CancelReason::Cancelled);
            }
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) -> CancelReason {
        tokio::select! {
            () = wait_cancelled(self.cancel.clone()) => CancelReason::Cancelled,
            () = wait_deadline(self.deadline) => CancelReason::DeadlineExceeded,
        }
    }
}

async fn wait_cancelled(rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = rx else {
        return std::future::pending().await;
    };

    loop {
        let fired = *rx.borrow_and_update();
        if fired {
            return;
        }
        // Handle dropped without cancelling: this context can only expire.
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
