//! Single-flight refresh coordination
//!
//! At most one refresh call is in flight at a time. Requests that hit a 401 while
//! it runs are parked on a oneshot channel and woken, in arrival order, when the
//! cycle settles.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::oneshot;

use super::AccessToken;

/// Reason handed to queued requests when a cycle fails
pub const REFRESH_FAILED: &str = "Token refresh failed";

/// Outcome delivered to every request queued during a cycle
pub type RefreshOutcome = std::result::Result<AccessToken, RefreshFailure>;

/// Why a refresh cycle failed, as seen by queued requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub reason: String,
}

impl RefreshFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Where the coordinator is in the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing { started_at: Instant },
}

/// What a request that got a 401 should do next
#[derive(Debug)]
pub enum RefreshTicket<'a> {
    /// No token stored, nothing to refresh
    NoSession,
    /// The stored token changed since the request was sent; retry with it
    Replay(AccessToken),
    /// A refresh is already running; wait on the receiver
    Follower(oneshot::Receiver<RefreshOutcome>),
    /// Caller runs the refresh and settles the cycle through the guard
    Leader(LeaderGuard<'a>),
}

struct Inner {
    state: RefreshState,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RefreshState::Idle,
                waiters: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide between replay, queue and refresh in one critical section.
    ///
    /// `sent_with` is the token the failed request carried and `current` reads
    /// the token store. The lock is synchronous, so nothing can suspend between
    /// reading the state and moving to `Refreshing`.
    pub fn begin(
        &self,
        sent_with: Option<&AccessToken>,
        current: impl FnOnce() -> Option<AccessToken>,
    ) -> RefreshTicket<'_> {
        let mut inner = self.lock();

        let Some(current) = current() else {
            return RefreshTicket::NoSession;
        };
        if sent_with != Some(&current) {
            return RefreshTicket::Replay(current);
        }

        match inner.state {
            RefreshState::Idle => {
                inner.state = RefreshState::Refreshing {
                    started_at: Instant::now(),
                };
                log::debug!("Refresh cycle started");
                RefreshTicket::Leader(LeaderGuard {
                    coordinator: self,
                    settled: false,
                })
            }
            RefreshState::Refreshing { .. } => {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                log::debug!("Refresh in flight, queued request #{}", inner.waiters.len());
                RefreshTicket::Follower(rx)
            }
        }
    }

    /// Back to Idle, then wake every queued request once.
    fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut inner = self.lock();
            if let RefreshState::Refreshing { started_at } = inner.state {
                log::debug!(
                    "Refresh cycle settled after {:?} ({}, {} queued)",
                    started_at.elapsed(),
                    if outcome.is_ok() { "success" } else { "failure" },
                    inner.waiters.len()
                );
            }
            inner.state = RefreshState::Idle;
            std::mem::take(&mut inner.waiters)
        };

        for waiter in waiters {
            // Receiver gone means the request stopped waiting
            let _ = waiter.send(outcome.clone());
        }
    }

    pub fn state(&self) -> RefreshState {
        self.lock().state
    }

    /// Number of requests currently parked on the cycle
    pub fn queued(&self) -> usize {
        self.lock().waiters.len()
    }
}

/// Proof of leadership for one cycle.
///
/// Dropping it unsettled (e.g. the leading request was cancelled) fails the
/// cycle so queued requests are never stranded.
#[derive(Debug)]
pub struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .field("queued", &self.queued())
            .finish()
    }
}

impl LeaderGuard<'_> {
    pub fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("Refresh abandoned before completion");
            self.coordinator
                .settle(Err(RefreshFailure::new(REFRESH_FAILED)));
        }
    }
}
