use anyhow::Result;
use calmirror_core::config::MirrorConfig;
use calmirror_core::provider::CalendarProvider;
use calmirror_core::sync::SyncWorker;
use owo_colors::OwoColorize;

use crate::render::PlanRender;
use crate::utils::tui;

pub async fn run<P: CalendarProvider>(
    provider: &P,
    config: &MirrorConfig,
    full: bool,
    json: bool,
) -> Result<()> {
    let mut worker = SyncWorker::new(provider, config)?;

    let spinner = tui::create_spinner("Loading calendars".to_string());
    let loaded = worker.setup().await;
    spinner.finish_and_clear();
    loaded?;

    let plan = worker.plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let range = worker.range();
    let window = format!(
        "Window: {} to {}",
        range.start().format("%Y-%m-%d %H:%M"),
        range.end().format("%Y-%m-%d %H:%M")
    );
    println!("{}\n", window.dimmed());

    for (i, child) in plan.0.iter().enumerate() {
        println!("{}", child.render(full));
        if i < plan.0.len() - 1 {
            println!();
        }
    }

    let (creates, deletes) = plan.counts();
    if creates > 0 || deletes > 0 {
        println!(
            "\nPending: {} to create, {} to delete (run `calmirror sync` to apply)",
            creates, deletes
        );
    }

    Ok(())
}
