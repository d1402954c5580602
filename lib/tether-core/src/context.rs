//! Call-scoped context.
//!
//! A [`Context`] travels with every [`HttpRequest`](crate::HttpRequest) through
//! the chain. It carries a typed key/value table, an optional deadline and an
//! optional cancellation signal. The dispatch step honors the deadline and the
//! cancellation signal; middleware doing their own I/O should too.
//!
//! The active transport is injected with [`set_transport`] right before a
//! request is sent, so any middleware can find it with [`get_transport`]
//! without it being threaded through every signature.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_all;
use http::Extensions;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{Error, Transport};

/// Call-scoped values, deadline and cancellation.
///
/// Cloning is cheap and clones observe the same cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: Extensions,
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Handle that cancels every [`Context`] derived from [`Context::with_cancel`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Context {
    /// Empty context: no values, no deadline, never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value of the same type.
    #[must_use]
    pub fn with_value<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.values.insert(value);
        self
    }

    /// Look up a value by type.
    #[must_use]
    pub fn value<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.values.get::<T>()
    }

    /// Set a deadline. An earlier existing deadline is kept.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Set a deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a cancellable context.
    ///
    /// Cancelling the returned handle cancels this context; cancelling a parent
    /// handle still cancels it too.
    #[must_use]
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        self.cancel.push(receiver);
        let handle = CancelHandle {
            sender: Arc::new(sender),
        };
        (self, handle)
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The reason this context is done, if it is.
    ///
    /// Cancellation takes precedence over an elapsed deadline.
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        if self.cancel.iter().any(|rx| *rx.borrow()) {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline elapses.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancelled().await,
        }
    }

    async fn cancelled(&self) {
        if self.cancel.is_empty() {
            return pending().await;
        }
        let waits = self.cancel.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                let cancelled = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                if !cancelled {
                    // every handle dropped without cancelling
                    pending::<()>().await;
                }
            })
        });
        select_all(waits).await;
    }

    /// The transport injected for the current call, if any.
    #[must_use]
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        get_transport(self)
    }
}

#[derive(Clone)]
struct TransportSlot(Arc<dyn Transport>);

/// Return a copy of `ctx` carrying `transport`.
#[must_use]
pub fn set_transport(ctx: Context, transport: Arc<dyn Transport>) -> Context {
    ctx.with_value(TransportSlot(transport))
}

/// The transport stored by [`set_transport`], or `None` when absent.
#[must_use]
pub fn get_transport(ctx: &Context) -> Option<Arc<dyn Transport>> {
    ctx.value::<TransportSlot>()
        .map(|slot| Arc::clone(&slot.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpResponse, transport_fn};

    #[derive(Debug, Clone, PartialEq)]
    struct RequestId(u64);

    #[test]
    fn values_round_trip() {
        let ctx = Context::background().with_value(RequestId(7));
        assert_eq!(ctx.value::<RequestId>(), Some(&RequestId(7)));
        assert!(ctx.value::<String>().is_none());
    }

    #[test]
    fn transport_round_trip() {
        let transport: Arc<dyn Transport> =
            Arc::new(transport_fn(|_| async { Ok(HttpResponse::ok()) }));
        let ctx = set_transport(Context::background(), Arc::clone(&transport));

        let found = get_transport(&ctx).expect("transport was injected");
        assert!(Arc::ptr_eq(&found, &transport));
    }

    #[test]
    fn missing_transport_is_none() {
        assert!(get_transport(&Context::background()).is_none());
        assert!(Context::background().transport().is_none());
    }

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_marks_clones_done() {
        let (ctx, handle) = Context::background().with_cancel();
        let clone = ctx.clone();
        assert!(!clone.is_done());

        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(matches!(clone.err(), Some(Error::Cancelled)));
    }

    #[test]
    fn child_observes_parent_cancellation() {
        let (parent, parent_handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.with_cancel();

        parent_handle.cancel();
        assert!(child.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_elapses() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_done());

        ctx.done().await;
        assert!(matches!(ctx.err(), Some(Error::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = Instant::now() + Duration::from_secs(60);
        let ctx = Context::background()
            .with_deadline(soon)
            .with_deadline(later);
        assert_eq!(ctx.deadline(), Some(soon));
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        let waiter = tokio::spawn(async move { ctx.done().await });

        handle.cancel();
        waiter.await.expect("waiter task");
    }
}
