//! TUI rendering traits for calmirror types.
//!
//! Extension traits that add colored terminal rendering to calmirror-core
//! types using owo_colors.

use calmirror_core::sync::{ChangeKind, ChildPlan, ChildReport, PlannedChange};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ChangeKind::Create => symbol.green().to_string(),
            ChangeKind::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize_change(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Create => text.green().to_string(),
        ChangeKind::Delete => text.red().to_string(),
    }
}

impl Render for PlannedChange {
    fn render(&self) -> String {
        let summary = colorize_change(self.kind, &self.summary);
        let mut line = format!(
            "{} {} {}",
            self.kind.render(),
            summary,
            self.start.to_string().dimmed()
        );
        if let Some(source) = &self.source {
            line.push_str(&format!(" {}", format!("from {}", source).dimmed()));
        }
        line
    }
}

/// Header line for a child calendar.
pub fn calendar_header(entity_id: &str) -> String {
    format!("📅 {}", entity_id)
}

impl Render for ChildReport {
    fn render(&self) -> String {
        let mut lines = vec![calendar_header(&self.entity_id)];

        if self.created == 0 && self.deleted == 0 {
            lines.push("   No changes".dimmed().to_string());
        }
        if self.deleted > 0 {
            let label = format!("({} removed {})", self.deleted, pluralize("event", self.deleted));
            lines.push(format!("   {} {}", "-".red(), label.red()));
        }
        if self.created > 0 {
            let label = format!("({} mirrored {})", self.created, pluralize("event", self.created));
            lines.push(format!("   {} {}", "+".green(), label.green()));
        }

        lines.join("\n")
    }
}

/// Above this many changes a calendar's plan is shown as counts.
const COMPACT_THRESHOLD: usize = 5;

pub trait PlanRender {
    fn render(&self, full: bool) -> String;
}

impl PlanRender for ChildPlan {
    fn render(&self, full: bool) -> String {
        let mut lines = vec![calendar_header(&self.entity_id)];

        if self.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        } else if full || self.changes.len() <= COMPACT_THRESHOLD {
            for change in &self.changes {
                lines.push(format!("   {}", change.render()));
            }
        } else {
            let deletes = self.count(ChangeKind::Delete);
            let creates = self.count(ChangeKind::Create);

            if deletes > 0 {
                let label = format!("({} stale {})", deletes, pluralize("event", deletes));
                lines.push(format!("   {} {}", "-".red(), label.red()));
            }
            if creates > 0 {
                let label = format!("({} new {})", creates, pluralize("event", creates));
                lines.push(format!("   {} {}", "+".green(), label.green()));
            }
        }

        lines.join("\n")
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
