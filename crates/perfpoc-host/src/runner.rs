//! Host/runner: provision, start every emitter, wait, stop.
//!
//! `Idle -> Provisioning -> Running -> Stopping -> Stopped`
//!
//! A start that has to provision the category halts right after provisioning
//! and reports [`Startup::RestartRequired`]; the process is expected to be run
//! again. Emitter failures are fail-fast: the first error ends the run after
//! the remaining emitters have been cancelled and drained.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::watch;

use perfpoc_core::error::{PerfError, Result};

use crate::cancel::{CancelSignal, CancelSource};
use crate::config::HostConfig;
use crate::counters::CounterSubsystem;
use crate::emitters::{self, EmitterTarget, MetricEmitter};
use crate::registry::MetricRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Idle,
    Provisioning,
    Running,
    Stopping,
    Stopped,
}

impl HostState {
    pub fn as_str(self) -> &'static str {
        match self {
            HostState::Idle => "idle",
            HostState::Provisioning => "provisioning",
            HostState::Running => "running",
            HostState::Stopping => "stopping",
            HostState::Stopped => "stopped",
        }
    }
}

/// Outcome of [`Host::start`].
pub enum Startup {
    /// The category was (re)created just now; run the host again.
    RestartRequired,
    Running(RunningHost),
}

pub struct Host {
    registry: MetricRegistry,
    emitters: Vec<Arc<dyn MetricEmitter>>,
    state: Arc<watch::Sender<HostState>>,
}

impl Host {
    pub fn new(registry: MetricRegistry, emitters: Vec<Arc<dyn MetricEmitter>>) -> Self {
        let (state, _rx) = watch::channel(HostState::Idle);
        Self {
            registry,
            emitters,
            state: Arc::new(state),
        }
    }

    /// Registry and emitters for the configured category.
    pub fn from_config(cfg: &HostConfig, counters: Arc<dyn CounterSubsystem>) -> Self {
        let target = EmitterTarget::new(cfg.category.name.as_str(), Arc::clone(&counters));
        let emitters = emitters::build_from_config(&cfg.emitters, &target);
        let registry = MetricRegistry::new(counters, cfg.category.name.clone(), cfg.category.description.clone())
            .verify_counters(cfg.category.verify_counters);
        Self::new(registry, emitters)
    }

    pub fn state(&self) -> HostState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<HostState> {
        self.state.subscribe()
    }

    /// Provision if needed, otherwise spawn one task per emitter.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<Startup> {
        match self.state() {
            HostState::Idle | HostState::Stopped => {}
            other => {
                return Err(PerfError::Internal(format!("host cannot start while {}", other.as_str())));
            }
        }
        self.state.send_replace(HostState::Provisioning);

        let descriptors = match MetricRegistry::declare_all(&self.emitters) {
            Ok(d) => d,
            Err(e) => return self.back_to_idle(e),
        };

        if !self.registry.is_provisioned(&descriptors) {
            if let Err(e) = self.registry.provision(&descriptors) {
                return self.back_to_idle(e);
            }
            tracing::info!(category = %self.registry.category(), "category provisioned, restart required");
            self.state.send_replace(HostState::Idle);
            return Ok(Startup::RestartRequired);
        }

        let cancel = CancelSource::new();
        let tasks = FuturesUnordered::new();
        for emitter in &self.emitters {
            tasks.push(spawn_emitter(Arc::clone(emitter), cancel.signal()));
        }
        tracing::info!(emitters = self.emitters.len(), "emitters started");
        self.state.send_replace(HostState::Running);

        Ok(Startup::Running(RunningHost {
            cancel,
            tasks,
            state: Arc::clone(&self.state),
        }))
    }

    fn back_to_idle<T>(&self, e: PerfError) -> Result<T> {
        self.state.send_replace(HostState::Idle);
        Err(e)
    }
}

fn spawn_emitter(emitter: Arc<dyn MetricEmitter>, signal: CancelSignal) -> BoxFuture<'static, Result<()>> {
    let name = emitter.name();
    let handle = tokio::spawn(async move { emitter.run(signal).await });
    async move {
        match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PerfError::EmitterFailed {
                emitter: name.to_string(),
                reason: e.to_string(),
            }),
            Err(join) => Err(PerfError::EmitterFailed {
                emitter: name.to_string(),
                reason: format!("task aborted: {join}"),
            }),
        }
    }
    .boxed()
}

/// Emitters of a started host. Dropping it cancels them.
pub struct RunningHost {
    cancel: CancelSource,
    tasks: FuturesUnordered<BoxFuture<'static, Result<()>>>,
    state: Arc<watch::Sender<HostState>>,
}

impl RunningHost {
    /// Signal shared with the emitters, for companion tasks.
    pub fn signal(&self) -> CancelSignal {
        self.cancel.signal()
    }

    /// Run until `stop` resolves or an emitter fails, then stop everything.
    pub async fn run_until<F>(mut self, stop: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let outcome = loop {
            tokio::select! {
                _ = &mut stop => break Ok(()),
                Some(res) = self.tasks.next(), if !self.tasks.is_empty() => {
                    if let Err(e) = res {
                        tracing::error!(error = %e, "emitter failed, stopping host");
                        break Err(e);
                    }
                }
            }
        };
        let drained = self.shutdown().await;
        outcome.and(drained)
    }

    /// Cancel every emitter and wait for all of them to return.
    pub async fn stop(mut self) -> Result<()> {
        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.send_replace(HostState::Stopping);
        self.cancel.cancel();

        let mut first_err = None;
        while let Some(res) = self.tasks.next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "emitter failed during shutdown");
                first_err.get_or_insert(e);
            }
        }

        self.state.send_replace(HostState::Stopped);
        tracing::info!("emitters stopped");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for RunningHost {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
