//! perfpoc managed worker host.
//!
//! Runs the worker role until SIGINT/SIGTERM, then drives `on_stop`.

use std::sync::Arc;

use perfpoc_core::error::Result;
use perfpoc_host::{
    config,
    counters::{CounterSubsystem, LocalCounters},
    runner::Host,
    worker::WorkerRole,
};

#[tokio::main]
async fn main() {
    perfpoc_host::init_tracing();

    let role = match build() {
        Ok(role) => Arc::new(role),
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "worker setup failed");
            std::process::exit(1);
        }
    };

    if !role.on_start() {
        std::process::exit(1);
    }

    let runner = {
        let role = Arc::clone(&role);
        tokio::spawn(async move { role.run().await })
    };

    let signalled = tokio::select! {
        _ = shutdown_signal() => true,
        _ = role.finished() => false,
    };
    if signalled {
        role.on_stop().await;
    }

    match runner.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(code = e.code().as_str(), error = %e, "worker run failed");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "worker run task aborted");
            std::process::exit(1);
        }
    }
}

fn build() -> Result<WorkerRole> {
    let cfg = config::load_default()?;
    let counters: Arc<dyn CounterSubsystem> = Arc::new(LocalCounters::from_config(&cfg.counters)?);
    Ok(WorkerRole::new(Host::from_config(&cfg, counters)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, stopping worker role");
}
