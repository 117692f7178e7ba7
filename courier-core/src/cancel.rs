//! One-shot cancellation tokens.
//!
//! A [`CancelToken`] starts pending and transitions to cancelled exactly once.
//! The first reason wins; later cancel calls are ignored. Reactions attached
//! with [`CancelToken::on_cancel`] run when the token is cancelled, or
//! immediately when it already is, so a late observer never misses the signal.
//!
//! # Example
//!
//! ```
//! use courier_core::CancelToken;
//!
//! let source = CancelToken::source();
//! let token = source.token();
//!
//! source.cancel_with("Operation canceled by user");
//! source.cancel_with("ignored");
//!
//! assert!(token.is_cancelled());
//! assert_eq!(token.reason().unwrap().message(), Some("Operation canceled by user"));
//! ```

use std::fmt;
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;

/// The reason a request was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    message: Option<String>,
}

impl Cancel {
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "request canceled: {}", message),
            None => f.write_str("request canceled"),
        }
    }
}

impl std::error::Error for Cancel {}

type Reaction = Box<dyn FnOnce(&Cancel) + Send>;

#[derive(Default)]
struct Pending {
    reactions: Vec<Reaction>,
    // Receivers of dropped `cancelled()` futures are pruned on every push.
    waiters: Vec<oneshot::Sender<Cancel>>,
}

enum State {
    Pending(Pending),
    Cancelled(Cancel),
}

struct Shared {
    state: Mutex<State>,
}

impl Shared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Pending(Pending::default())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Reactions run outside the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self, reason: Cancel) -> bool {
        let pending = {
            let mut state = self.lock();
            match &mut *state {
                State::Cancelled(_) => return false,
                State::Pending(pending) => {
                    let pending = mem::take(pending);
                    *state = State::Cancelled(reason.clone());
                    pending
                }
            }
        };

        for reaction in pending.reactions {
            reaction(&reason);
        }
        for waiter in pending.waiters {
            let _ = waiter.send(reason.clone());
        }
        true
    }

    fn on_cancel(&self, reaction: Reaction) {
        let reason = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(pending) => {
                    pending.reactions.push(reaction);
                    return;
                }
                State::Cancelled(reason) => reason.clone(),
            }
        };
        reaction(&reason);
    }

    fn wait(&self, waiter: oneshot::Sender<Cancel>) {
        let reason = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(pending) => {
                    pending.waiters.retain(|tx| !tx.is_canceled());
                    pending.waiters.push(waiter);
                    return;
                }
                State::Cancelled(reason) => reason.clone(),
            }
        };
        let _ = waiter.send(reason);
    }

    fn reason(&self) -> Option<Cancel> {
        match &*self.lock() {
            State::Pending(_) => None,
            State::Cancelled(reason) => Some(reason.clone()),
        }
    }

    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        match &*self.lock() {
            State::Pending(pending) => pending.waiters.len(),
            State::Cancelled(_) => 0,
        }
    }
}

/// A shareable, one-shot cancellation signal.
///
/// Clones observe the same state.
#[derive(Clone)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    /// Create a token, handing its trigger to `executor` synchronously.
    ///
    /// ```
    /// use courier_core::{CancelToken, Canceler};
    ///
    /// let mut cancel: Option<Canceler> = None;
    /// let token = CancelToken::new(|c| cancel = Some(c));
    ///
    /// cancel.unwrap().cancel();
    /// assert!(token.is_cancelled());
    /// ```
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Canceler),
    {
        let shared = Shared::new();
        executor(Canceler {
            shared: shared.clone(),
        });
        Self { shared }
    }

    /// Create a token together with its trigger.
    pub fn source() -> CancelSource {
        let shared = Shared::new();
        CancelSource {
            token: CancelToken {
                shared: shared.clone(),
            },
            canceler: Canceler { shared },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The cancellation reason, once cancelled.
    pub fn reason(&self) -> Option<Cancel> {
        self.shared.reason()
    }

    /// Fail with the cancellation reason if the token has been cancelled.
    pub fn throw_if_requested(&self) -> Result<(), Cancel> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Run `reaction` once the token is cancelled.
    ///
    /// If the token is already cancelled the reaction runs immediately, on the
    /// calling thread, with the original reason.
    pub fn on_cancel<F>(&self, reaction: F)
    where
        F: FnOnce(&Cancel) + Send + 'static,
    {
        self.shared.on_cancel(Box::new(reaction));
    }

    /// A future resolving to the reason once the token is cancelled.
    ///
    /// The future stays pending forever if every trigger is dropped without
    /// cancelling.
    pub fn cancelled(&self) -> impl Future<Output = Cancel> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.shared.wait(tx);
        async move {
            match rx.await {
                Ok(reason) => reason,
                Err(_) => std::future::pending().await,
            }
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}

/// The trigger of a [`CancelToken`].
#[derive(Clone)]
pub struct Canceler {
    shared: Arc<Shared>,
}

impl Canceler {
    /// Cancel without a message.
    ///
    /// Returns `false` if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel(Cancel::new(None))
    }

    /// Cancel with a message.
    ///
    /// Returns `false` if the token was already cancelled; the first reason is kept.
    pub fn cancel_with(&self, message: impl Into<String>) -> bool {
        self.shared.cancel(Cancel::new(Some(message.into())))
    }
}

impl fmt::Debug for Canceler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Canceler")
    }
}

/// A token paired with its trigger, returned by [`CancelToken::source`].
#[derive(Debug, Clone)]
pub struct CancelSource {
    token: CancelToken,
    canceler: Canceler,
}

impl CancelSource {
    /// A handle to the token, to be placed in a request configuration.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn canceler(&self) -> Canceler {
        self.canceler.clone()
    }

    pub fn cancel(&self) -> bool {
        self.canceler.cancel()
    }

    pub fn cancel_with(&self, message: impl Into<String>) -> bool {
        self.canceler.cancel_with(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_source_starts_pending() {
        let source = CancelToken::source();
        assert!(!source.token().is_cancelled());
        assert!(source.token().reason().is_none());
        assert!(source.token().throw_if_requested().is_ok());
    }

    #[test]
    fn test_first_reason_wins() {
        let source = CancelToken::source();
        assert!(source.cancel_with("first"));
        assert!(!source.cancel_with("second"));
        assert!(!source.cancel());

        let token = source.token();
        assert!(token.is_cancelled());
        assert_eq!(token.reason().unwrap().message(), Some("first"));
        assert_eq!(token.throw_if_requested().unwrap_err().message(), Some("first"));
    }

    #[test]
    fn test_executor_runs_synchronously() {
        let mut captured = None;
        let token = CancelToken::new(|canceler| captured = Some(canceler));
        let canceler = captured.unwrap();

        assert!(!token.is_cancelled());
        canceler.cancel_with("stop");
        assert_eq!(token.reason(), Some(Cancel::new(Some("stop".into()))));
    }

    #[test]
    fn test_reactions_fire_once_on_cancel() {
        let source = CancelToken::source();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let fired = fired.clone();
            source.token().on_cancel(move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        source.cancel();
        source.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_late_reaction_fires_with_original_reason() {
        let source = CancelToken::source();
        source.cancel_with("original");
        source.cancel_with("later");

        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        source.token().on_cancel(move |reason| {
            *seen_clone.lock().unwrap() = reason.message().map(str::to_owned);
        });

        assert_eq!(seen.lock().unwrap().as_deref(), Some("original"));
    }

    #[test]
    fn test_reaction_may_reenter_token() {
        let source = CancelToken::source();
        let token = source.token();
        let observed = Arc::new(Mutex::new(false));
        let observed_clone = observed.clone();
        let inner = token.clone();
        token.on_cancel(move |_| {
            *observed_clone.lock().unwrap() = inner.is_cancelled();
        });

        source.cancel();
        assert!(*observed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let source = CancelToken::source();
        let waiter = tokio::spawn(source.token().cancelled());

        tokio::task::yield_now().await;
        source.cancel_with("bye");

        let reason = waiter.await.unwrap();
        assert_eq!(reason.message(), Some("bye"));
    }

    #[tokio::test]
    async fn test_cancelled_future_after_cancel() {
        let source = CancelToken::source();
        source.cancel();
        let reason = source.token().cancelled().await;
        assert_eq!(reason.message(), None);
    }

    #[test]
    fn test_dropped_waiters_do_not_accumulate() {
        let source = CancelToken::source();
        let token = source.token();
        for _ in 0..1000 {
            drop(token.cancelled());
        }
        assert!(token.shared.waiter_count() <= 1);

        let live = token.cancelled();
        drop(token.cancelled());
        assert!(token.shared.waiter_count() <= 2);

        source.cancel_with("done");
        let reason = futures::executor::block_on(live);
        assert_eq!(reason.message(), Some("done"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cancel::new(None).to_string(), "request canceled");
        assert_eq!(
            Cancel::new(Some("x".into())).to_string(),
            "request canceled: x"
        );
    }
}
