//! Cooperative cancellation driven by OS signals

use crate::common::Result;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Signal that triggered the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Sigint,
    Sigterm,
    Sighup,
    Sigquit,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Sigint => write!(f, "SIGINT"),
            ShutdownSignal::Sigterm => write!(f, "SIGTERM"),
            ShutdownSignal::Sighup => write!(f, "SIGHUP"),
            ShutdownSignal::Sigquit => write!(f, "SIGQUIT"),
        }
    }
}

/// Process-wide cancellation handle. Clones share the same state.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`Shutdown::trigger`] has been called
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|triggered| *triggered).await.is_err() {
            // Sender lives as long as `self`, so this never resolves
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Install handlers for SIGINT, SIGTERM, SIGHUP and SIGQUIT.
///
/// SIGKILL cannot be caught and is not part of the set.
#[cfg(unix)]
pub fn install_signal_handlers(shutdown: Shutdown) -> Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        let received = tokio::select! {
            _ = sigint.recv() => ShutdownSignal::Sigint,
            _ = sigterm.recv() => ShutdownSignal::Sigterm,
            _ = sighup.recv() => ShutdownSignal::Sighup,
            _ = sigquit.recv() => ShutdownSignal::Sigquit,
        };
        tracing::info!(signal = %received, "Received signal, cancelling init");
        shutdown.trigger();
    }))
}

/// Only Ctrl+C is available outside Unix
#[cfg(not(unix))]
pub fn install_signal_handlers(shutdown: Shutdown) -> Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        tracing::info!(signal = %ShutdownSignal::Sigint, "Received signal, cancelling init");
        shutdown.trigger();
    }))
}
