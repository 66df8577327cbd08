//! Run the reconcile daemon until interrupted.

use anyhow::Result;
use clap::Args;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::context::AppContext;
use crate::services::{ReconcileDaemon, ReconcileDaemonConfig, ReconcileDaemonEvent, StopReason};

/// Arguments for `atc serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override reconciler.interval_secs
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

/// Run the daemon until Ctrl-C or too many failed passes.
pub async fn execute(args: ServeArgs, ctx: &AppContext) -> Result<()> {
    let pool = ctx.open_database().await?;
    let stop_flag = Arc::new(AtomicBool::new(false));
    let reconciler = ctx.reconciler(&pool, stop_flag.clone())?;

    let mut config = ReconcileDaemonConfig::from(&ctx.config.reconciler);
    if let Some(secs) = args.interval_secs {
        config.pass_interval = Duration::from_secs(secs.max(1));
    }

    let daemon = ReconcileDaemon::new(reconciler, config, stop_flag);
    let handle = daemon.handle();
    let mut events = daemon.run();

    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    let mut interrupted = false;

    loop {
        tokio::select! {
            signal = &mut ctrl_c, if !interrupted => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "failed to listen for ctrl-c");
                }
                tracing::info!("shutdown requested, waiting for in-flight operations");
                interrupted = true;
                handle.stop();
            }
            event = events.recv() => match event {
                Some(ReconcileDaemonEvent::PassCompleted { pass_number, report, duration_ms }) => {
                    tracing::info!(
                        pass_number,
                        formations = report.reports.len(),
                        builds = report.builds(),
                        destroys = report.destroys(),
                        duration_ms,
                        "reconcile pass completed"
                    );
                }
                Some(ReconcileDaemonEvent::Stopped { reason }) => {
                    if reason == StopReason::TooManyFailures {
                        anyhow::bail!("reconcile daemon stopped after repeated failures");
                    }
                    break;
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    Ok(())
}
