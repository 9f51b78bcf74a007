//! Shared, lazily initialized classifier session.
//!
//! Lifecycle: `Uninitialized -> Initializing -> Ready | Failed`. Exactly one
//! caller runs the loader at a time; every caller that arrives while it runs
//! waits on the same outcome. `Failed` is retried after an exponential
//! backoff until the attempt cap is reached.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::ports::SessionLoader;

/// How repeated initialization failures are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total load attempts before the session stays failed.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound on the wait between attempts.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Wait imposed after `failures` consecutive failures (doubling, capped).
    #[must_use]
    pub fn backoff_after(&self, failures: u32) -> Duration {
        let doublings = failures.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }
}

/// Why the session is unavailable. Cloned to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The loader failed.
    #[error("{0}")]
    Init(String),

    /// A previous failure is still inside its backoff window.
    #[error("{message} (next attempt in {}ms)", retry_in.as_millis())]
    Backoff {
        /// The stored failure.
        message: String,
        /// Time until a new attempt is allowed.
        retry_in: Duration,
    },

    /// The attempt cap was reached.
    #[error("{message} (gave up after {attempts} attempts)")]
    Exhausted {
        /// The last failure.
        message: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The initializing call was dropped before it finished.
    #[error("initialization was abandoned before completing")]
    Abandoned,
}

/// Non-blocking snapshot of the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No attempt made yet.
    Uninitialized,
    /// A load is in flight.
    Initializing,
    /// The classifier is loaded.
    Ready,
    /// The last attempt failed.
    Failed {
        /// The stored error.
        error: String,
        /// Consecutive failed attempts.
        attempts: u32,
    },
}

type Outcome<C> = Result<Arc<C>, SessionError>;

enum State<C> {
    Uninitialized,
    Initializing(watch::Receiver<Option<Outcome<C>>>),
    Ready(Arc<C>),
    Failed {
        message: String,
        attempts: u32,
        retry_at: Instant,
    },
}

enum Step<C> {
    Done(Outcome<C>),
    Wait(watch::Receiver<Option<Outcome<C>>>),
    Start(watch::Sender<Option<Outcome<C>>>, u32),
}

/// Owns the loader and the single shared classifier it produces.
pub struct SessionCell<L: SessionLoader> {
    loader: L,
    policy: RetryPolicy,
    state: Mutex<State<L::Classifier>>,
    loads: AtomicU32,
}

impl<L: SessionLoader> SessionCell<L> {
    /// Creates an uninitialized session.
    #[must_use]
    pub fn new(loader: L, policy: RetryPolicy) -> Self {
        Self {
            loader,
            policy,
            state: Mutex::new(State::Uninitialized),
            loads: AtomicU32::new(0),
        }
    }

    /// Returns the classifier, initializing it if needed.
    ///
    /// # Errors
    ///
    /// Returns the shared [`SessionError`] if initialization failed, is
    /// backing off, or gave up.
    pub async fn get(&self) -> Outcome<L::Classifier> {
        match self.next_step() {
            Step::Done(outcome) => outcome,
            Step::Wait(rx) => Self::wait(rx).await,
            Step::Start(tx, prior) => self.initialize(tx, prior).await,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match &*self.lock() {
            State::Uninitialized => SessionStatus::Uninitialized,
            State::Initializing(_) => SessionStatus::Initializing,
            State::Ready(_) => SessionStatus::Ready,
            State::Failed {
                message, attempts, ..
            } => SessionStatus::Failed {
                error: message.clone(),
                attempts: *attempts,
            },
        }
    }

    /// Number of times the loader has been invoked.
    #[must_use]
    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State<L::Classifier>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_step(&self) -> Step<L::Classifier> {
        let now = Instant::now();
        let mut state = self.lock();

        let prior = match &*state {
            State::Ready(classifier) => return Step::Done(Ok(Arc::clone(classifier))),
            State::Initializing(rx) => return Step::Wait(rx.clone()),
            State::Failed {
                message, attempts, ..
            } if *attempts >= self.policy.max_attempts => {
                return Step::Done(Err(SessionError::Exhausted {
                    message: message.clone(),
                    attempts: *attempts,
                }));
            }
            State::Failed {
                message, retry_at, ..
            } if now < *retry_at => {
                return Step::Done(Err(SessionError::Backoff {
                    message: message.clone(),
                    retry_in: *retry_at - now,
                }));
            }
            State::Failed { attempts, .. } => *attempts,
            State::Uninitialized => 0,
        };

        let (tx, rx) = watch::channel(None);
        *state = State::Initializing(rx);
        Step::Start(tx, prior)
    }

    async fn wait(mut rx: watch::Receiver<Option<Outcome<L::Classifier>>>) -> Outcome<L::Classifier> {
        match rx.wait_for(Option::is_some).await {
            Ok(value) => {
                let outcome: Option<Outcome<L::Classifier>> = (*value).clone();
                outcome.unwrap_or(Err(SessionError::Abandoned))
            }
            Err(_) => Err(SessionError::Abandoned),
        }
    }

    async fn initialize(
        &self,
        tx: watch::Sender<Option<Outcome<L::Classifier>>>,
        prior: u32,
    ) -> Outcome<L::Classifier> {
        let mut guard = AbandonGuard {
            state: &self.state,
            prior,
            armed: true,
        };

        let attempt = prior + 1;
        self.loads.fetch_add(1, Ordering::SeqCst);
        info!("Initializing classifier session (attempt {attempt})");

        let outcome = match self.loader.load().await {
            Ok(classifier) => {
                info!("Classifier session ready");
                Ok(Arc::new(classifier))
            }
            Err(e) => {
                let message = format!("{e:#}");
                warn!("Classifier session initialization failed: {message}");
                Err(SessionError::Init(message))
            }
        };

        *self.lock() = match &outcome {
            Ok(classifier) => State::Ready(Arc::clone(classifier)),
            Err(e) => State::Failed {
                message: e.to_string(),
                attempts: attempt,
                retry_at: Instant::now() + self.policy.backoff_after(attempt),
            },
        };
        guard.armed = false;

        tx.send_replace(Some(outcome.clone()));
        outcome
    }
}

/// Restores a retryable state if the initializing future is dropped.
struct AbandonGuard<'a, C> {
    state: &'a Mutex<State<C>>,
    prior: u32,
    armed: bool,
}

impl<C> Drop for AbandonGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Classifier session initialization abandoned");
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = if self.prior == 0 {
            State::Uninitialized
        } else {
            State::Failed {
                message: SessionError::Abandoned.to_string(),
                attempts: self.prior,
                retry_at: Instant::now(),
            }
        };
    }
}
