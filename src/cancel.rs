//! Cooperative cancellation shared by the prober and the engine.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag that aborts an in-flight resolution run.
///
/// Probes and the process executor poll [`CancelToken::is_cancelled`]; the
/// engine checks it once more before persisting so that an interrupted run
/// never replaces a previously valid cache.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Create a token that is cancelled by Ctrl-C / SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if a Ctrl-C handler is already installed.
    pub fn with_ctrlc_handler() -> anyhow::Result<Self> {
        let token = Self::new();
        let handle = token.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, aborting configuration");
            handle.cancel();
        })?;
        Ok(token)
    }
}
