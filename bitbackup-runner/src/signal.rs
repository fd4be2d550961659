//! Cancellation signal
//!
//! A process-wide stop request raised by SIGINT, SIGTERM or SIGQUIT. The
//! orchestrator checks it between submissions; jobs already handed to a
//! worker always run to completion.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Cooperative, set-once stop flag
///
/// Clones share the same flag. [`CancellationSignal::new`] gives a flag only
/// raised through [`trigger`](Self::trigger); [`CancellationSignal::install`]
/// additionally wires it to the OS signals.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    requested: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a signal raised by the first interrupt, terminate or quit
    ///
    /// Must be called from within a Tokio runtime. Later signals are
    /// ignored, so a second Ctrl-C does not abort in-flight backups.
    pub fn install() -> io::Result<Self> {
        let cancellation = Self::new();
        listen(cancellation.clone())?;
        Ok(cancellation)
    }

    /// Raises the flag; returns `true` only for the call that raised it
    pub fn trigger(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    /// Non-blocking check of the flag
    pub fn should_stop(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

fn on_signal(cancellation: &CancellationSignal, name: &str) {
    if cancellation.trigger() {
        warn!(
            "Received {}, no new backups will start; waiting for in-flight backups",
            name
        );
    } else {
        debug!("Ignoring repeated {}", name);
    }
}

#[cfg(unix)]
fn listen(cancellation: CancellationSignal) -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                Some(()) = quit.recv() => "SIGQUIT",
                else => break,
            };
            on_signal(&cancellation, name);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn listen(cancellation: CancellationSignal) -> io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            on_signal(&cancellation, "Ctrl-C");
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_signal_is_not_raised() {
        assert!(!CancellationSignal::new().should_stop());
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let cancellation = CancellationSignal::new();

        assert!(cancellation.trigger());
        assert!(!cancellation.trigger());
        assert!(cancellation.should_stop());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let cancellation = CancellationSignal::new();
        let observer = cancellation.clone();

        on_signal(&cancellation, "SIGTERM");
        on_signal(&cancellation, "SIGINT");

        assert!(observer.should_stop());
    }

    #[tokio::test]
    async fn test_install_starts_lowered() {
        let cancellation = CancellationSignal::install().unwrap();
        assert!(!cancellation.should_stop());
    }
}
