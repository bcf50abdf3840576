use anyhow::Result;
use calmirror_core::config::MirrorConfig;
use calmirror_core::provider::CalendarProvider;
use calmirror_core::sync::{SyncReport, SyncWorker};

use crate::render::Render;
use crate::utils::tui;

pub async fn run<P: CalendarProvider>(provider: &P, config: &MirrorConfig) -> Result<SyncReport> {
    let mut worker = SyncWorker::new(provider, config)?;

    let spinner = tui::create_spinner("Loading calendars".to_string());
    let loaded = worker.setup().await;
    spinner.finish_and_clear();
    loaded?;

    let spinner = tui::create_spinner("Mirroring events".to_string());
    let result = worker.sync().await;
    spinner.finish_and_clear();
    let report = result?;

    for (i, child) in report.0.iter().enumerate() {
        println!("{}", child.render());
        if i < report.0.len() - 1 {
            println!();
        }
    }

    if !report.is_empty() {
        println!(
            "\nMirrored: {} created, {} deleted",
            report.created(),
            report.deleted()
        );
    }

    Ok(report)
}
