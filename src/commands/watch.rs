use std::time::Duration;

use anyhow::Result;
use calmirror_core::config::MirrorConfig;
use calmirror_core::provider::CalendarProvider;
use chrono::Local;
use owo_colors::OwoColorize;
use tokio::time::MissedTickBehavior;
use tracing::error;

/// Run a pass immediately, then once per `every`, until Ctrl-C.
///
/// A failed pass is reported and the loop keeps going; the next pass
/// picks up wherever the failed one stopped.
pub async fn run<P: CalendarProvider>(
    provider: &P,
    config: &MirrorConfig,
    every: Duration,
) -> Result<()> {
    println!(
        "Watching, syncing every {} (Ctrl-C to stop)",
        humantime::format_duration(every)
    );

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stamp = format!("[{}]", Local::now().format("%Y-%m-%d %H:%M"));
                println!("\n{}", stamp.dimmed());

                if let Err(e) = super::sync::run(provider, config).await {
                    error!(error = %e, "Reconciliation run failed");
                    println!("   {}", e.to_string().red());
                }
            }
            result = &mut shutdown => {
                result?;
                println!("Stopped");
                break;
            }
        }
    }

    Ok(())
}
