//! perfpoc console host.
//!
//! - First run: provisions the counter category, then asks for a restart
//! - Later runs: starts every emitter, Enter (or Ctrl-C) stops them
//! - Optional ops endpoint for scrapers (`ops.listen`)

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use perfpoc_core::error::{PerfError, Result};
use perfpoc_host::{
    app_state::AppState,
    cancel::CancelSource,
    config,
    counters::{CounterSubsystem, LocalCounters},
    monitor::Monitor,
    router,
    runner::{Host, Startup},
};

type Console = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    perfpoc_host::init_tracing();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "perfpoc failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_default()?;
    let counters: Arc<dyn CounterSubsystem> = Arc::new(LocalCounters::from_config(&cfg.counters)?);
    let host = Host::from_config(&cfg, Arc::clone(&counters));
    let mut console = BufReader::new(tokio::io::stdin()).lines();

    let ops_stop = CancelSource::new();
    if let Some(listen) = &cfg.ops.listen {
        let listen: std::net::SocketAddr = listen
            .parse()
            .map_err(|e| PerfError::BadConfig(format!("ops.listen: {e}")))?;
        let state = AppState::new(Arc::clone(&counters), cfg.category.name.clone(), host.subscribe_state());
        let signal = ops_stop.signal();
        tokio::spawn(async move {
            if let Err(e) = router::serve(listen, state, async move { signal.cancelled().await }).await {
                tracing::error!(%listen, error = %e, "ops endpoint failed");
            }
        });
    }

    let outcome = match host.start()? {
        Startup::RestartRequired => {
            println!(
                "Just set up the performance counter category {}. Press enter to exit, and then re-run the application..",
                cfg.category.name
            );
            wait_enter(&mut console).await;
            Ok(())
        }
        Startup::Running(running) => {
            if cfg.monitor.log_interval_ms > 0 {
                let monitor = Arc::new(Monitor::new(Arc::clone(&counters), cfg.category.name.clone()));
                tokio::spawn(monitor.log_until(Duration::from_millis(cfg.monitor.log_interval_ms), running.signal()));
            }

            println!("Press enter to cancel..");
            let res = running.run_until(stop_requested(&mut console)).await;
            if res.is_ok() {
                println!("Workers stopped. Press enter to quit.");
                wait_enter(&mut console).await;
            }
            res
        }
    };

    ops_stop.cancel();
    outcome
}

async fn wait_enter(console: &mut Console) {
    let _ = console.next_line().await;
}

async fn stop_requested(console: &mut Console) {
    tokio::select! {
        _ = console.next_line() => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    }
    tracing::info!("stop requested");
}
