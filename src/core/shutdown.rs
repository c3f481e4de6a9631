//! Shutdown coordination for the pipeline
//!
//! The first SIGINT, SIGTERM or SIGHUP requests shutdown: subscribers (the
//! drill's queue closer) receive a broadcast and the pipeline drains what it
//! already accepted. A second signal exits immediately with status 130.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used when a second signal cuts the drain short
pub const FORCED_EXIT_CODE: i32 = 130;

/// Broadcasts a single shutdown request to every subscriber
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
    signals_seen: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);

        let coordinator = Self {
            shutdown_tx,
            requested: Arc::new(AtomicBool::new(false)),
            signals_seen: Arc::new(AtomicUsize::new(0)),
        };

        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown. Only the first request is broadcast.
    pub fn trigger_shutdown(&self) {
        if !self.requested.swap(true, Ordering::AcqRel) {
            let _ = self.shutdown_tx.send(());
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Record a received signal; returns true when it should force an exit
    fn on_signal(&self, name: &str) -> bool {
        let previous = self.signals_seen.fetch_add(1, Ordering::AcqRel);
        if previous >= 1 {
            log::warn!("Second shutdown signal ({}) received; exiting", name);
            return true;
        }
        log::info!("{} received; closing pipeline queue", name);
        self.trigger_shutdown();
        false
    }

    /// Run a future with signal handlers installed, giving it the coordinator
    /// and a shutdown receiver
    pub async fn guard_with_coordinator<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(Self, broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        coordinator.install_signal_handlers();
        future_fn(coordinator, shutdown_rx).await
    }

    fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            // Let a closed stdout terminate the process quietly
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            let signals = [
                (SignalKind::interrupt(), "SIGINT"),
                (SignalKind::terminate(), "SIGTERM"),
                (SignalKind::hangup(), "SIGHUP"),
            ];

            for (kind, name) in signals {
                let coordinator = self.clone();
                tokio::spawn(async move {
                    let mut stream = match signal(kind) {
                        Ok(stream) => stream,
                        Err(e) => {
                            log::warn!("Cannot listen for {}: {}", name, e);
                            return;
                        }
                    };
                    while stream.recv().await.is_some() {
                        if coordinator.on_signal(name) {
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.clone();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if coordinator.on_signal("Ctrl-C") {
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                }
            });
        }
    }
}
