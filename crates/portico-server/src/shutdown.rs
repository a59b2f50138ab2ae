//! Graceful shutdown.
//!
//! A [`ShutdownSignal`] is shared by the accept loop and every open
//! connection. Once it fires, the accept loop stops taking connections,
//! open connections finish their current request, and [`InFlight`] tells
//! the loop when they are all gone.
//!
//! # Example
//!
//! ```rust
//! use portico_server::ShutdownSignal;
//!
//! # tokio_test::block_on(async {
//! let shutdown = ShutdownSignal::new();
//! let waiter = shutdown.clone();
//!
//! shutdown.trigger();
//! waiter.wait().await;
//! assert!(waiter.is_triggered());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{broadcast, Notify};

/// A cloneable signal that fires once.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates a signal that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Fires the signal. Later calls do nothing.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine.
            let _ = self.sender.send(());
        }
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Returns a future that completes when the signal fires, or at once
    /// if it already has.
    pub fn wait(&self) -> ShutdownWait {
        // Subscribe before checking the flag so a trigger in between is seen.
        let mut receiver = self.sender.subscribe();
        let triggered = Arc::clone(&self.triggered);
        ShutdownWait {
            inner: Box::pin(async move {
                if triggered.load(Ordering::SeqCst) {
                    return;
                }
                // Lagged or closed both mean the signal can no longer be missed.
                let _ = receiver.recv().await;
            }),
        }
    }

    /// Creates a signal that fires on SIGINT or SIGTERM (Ctrl+C elsewhere).
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            if wait_for_os_signal().await {
                trigger.trigger();
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`ShutdownSignal::wait`].
///
/// Holds one pending receive for its whole life so the registered waker is
/// never dropped between polls.
pub struct ShutdownWait {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl fmt::Debug for ShutdownWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownWait").finish_non_exhaustive()
    }
}

impl Future for ShutdownWait {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Waits for an OS shutdown signal. Returns false if no handler could be
/// installed.
async fn wait_for_os_signal() -> bool {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(err), _) | (_, Err(err)) => {
                    tracing::error!(error = %err, "failed to install shutdown signal handlers");
                    return false;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
        true
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl+C, shutting down");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install Ctrl+C handler");
                false
            }
        }
    }
}

/// Counts open connections so shutdown can wait for them to drain.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl InFlight {
    /// Creates a tracker with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one connection as open until the guard is dropped.
    #[must_use]
    pub fn enter(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
            drained: Arc::clone(&self.drained),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Completes once no connections are open.
    pub async fn drained(&self) {
        loop {
            // Register before checking so a drop in between is not missed.
            let notified = self.drained.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps a connection counted by [`InFlight`] while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}
