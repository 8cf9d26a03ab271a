//! Cooperative cancellation.
//!
//! SIGINT trips a shared [`CancelToken`]; every wait loop polls it between
//! bounded sleeps and tears down what it owns when it is set.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll interval for [`CancelToken::sleep`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route SIGINT to this token. Only the first install in a process wins.
    pub fn install_ctrlc_handler(&self) {
        let token = self.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("info: Received stop signal, msprof will quit");
            token.cancel();
        }) {
            warn!("failed to install SIGINT handler: {e}");
        } else {
            debug!("SIGINT handler installed");
        }
    }

    /// Sleep up to `total`, waking every [`POLL_INTERVAL`] to check for
    /// cancellation. Returns `true` if cancelled.
    #[must_use]
    pub fn sleep(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}
