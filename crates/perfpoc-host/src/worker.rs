//! Managed worker-role host: `on_start`, `run`, `on_stop`.
//!
//! `run` blocks until `on_stop` cancels it; `on_stop` returns only after
//! `run` has fully drained. When `run` had to provision the category it
//! returns right away so the platform recycles the role. A `run` that begins
//! after `on_stop` returns without starting the host.

use tokio::sync::watch;

use perfpoc_core::error::Result;

use crate::cancel::CancelSource;
use crate::runner::{Host, Startup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPhase {
    NotStarted,
    Running,
    Finished,
}

pub struct WorkerRole {
    host: Host,
    cancel: CancelSource,
    phase: watch::Sender<RunPhase>,
}

impl WorkerRole {
    pub fn new(host: Host) -> Self {
        let (phase, _rx) = watch::channel(RunPhase::NotStarted);
        Self {
            host,
            cancel: CancelSource::new(),
            phase,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn on_start(&self) -> bool {
        tracing::info!("worker role has been started");
        true
    }

    pub async fn run(&self) -> Result<()> {
        // phase first, then the cancel check: pairs with the order in on_stop
        self.phase.send_replace(RunPhase::Running);
        let res = if self.cancel.is_cancelled() {
            tracing::info!("worker role stopped before running");
            Ok(())
        } else {
            tracing::info!("worker role is running");
            self.run_inner().await
        };
        self.phase.send_replace(RunPhase::Finished);
        res
    }

    async fn run_inner(&self) -> Result<()> {
        match self.host.start()? {
            Startup::RestartRequired => {
                tracing::warn!("counter category was provisioned, returning so the role is recycled");
                Ok(())
            }
            Startup::Running(running) => {
                let signal = self.cancel.signal();
                running.run_until(async move { signal.cancelled().await }).await
            }
        }
    }

    /// Request cancellation and wait until a begun `run` has returned.
    pub async fn on_stop(&self) {
        tracing::info!("worker role is stopping");
        self.cancel.cancel();

        if *self.phase.borrow() != RunPhase::NotStarted {
            self.finished().await;
        }
        tracing::info!("worker role has stopped");
    }

    /// Resolves once `run` has returned.
    pub async fn finished(&self) {
        let mut phase = self.phase.subscribe();
        let _ = phase.wait_for(|p| *p == RunPhase::Finished).await;
    }
}
