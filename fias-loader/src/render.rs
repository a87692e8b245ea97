//! Terminal status screen.
//!
//! Redraws the whole screen on every refresh: a header, one line per entity
//! slot, the start time with the running duration, and the quit hint. In
//! plain mode frames are written one after another with no escape
//! sequences, for redirected output and CI logs.

use chrono::{DateTime, Local};
use colored::Colorize;
use fias_loader_core::{StatusRenderer, StatusView};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const TIME_LAYOUT: &str = "%Y-%m-%d at %H:%M";
const FAILURE_MARKER: &str = " failed after ";

/// Renders status frames to a writer.
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    title: String,
    cores: usize,
    plain: bool,
}

impl TerminalRenderer<std::io::Stdout> {
    /// Renderer on standard output.
    pub fn stdout(title: impl Into<String>, plain: bool) -> Self {
        Self::new(std::io::stdout(), title, plain)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Renderer on `out`.
    pub fn new(out: W, title: impl Into<String>, plain: bool) -> Self {
        Self {
            out,
            title: title.into(),
            cores: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            plain,
        }
    }

    /// Consumes the renderer and returns the writer.
    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn frame(&self, view: &StatusView<'_>) -> String {
        let mut lines = Vec::with_capacity(view.snapshot.slots().len().saturating_add(7));

        lines.push(self.paint(&self.title, |s| s.green().bold().to_string()));
        lines.push(self.paint(&format!("Cores in use: {}", self.cores), |s| {
            s.yellow().to_string()
        }));
        lines.push(String::new());

        for slot in view.snapshot.slots() {
            if slot.contains(FAILURE_MARKER) {
                lines.push(self.paint(slot, |s| s.red().to_string()));
            } else {
                lines.push(slot.clone());
            }
        }

        lines.push(String::new());
        lines.push(self.paint(&started_line(view.started_at), |s| s.cyan().to_string()));
        if view.finished {
            lines.push(self.paint(&finished_line(view.elapsed), |s| {
                s.green().to_string()
            }));
        } else {
            lines.push(self.paint(&running_line(view.elapsed), |s| s.cyan().to_string()));
            lines.push(self.paint("Press Ctrl+C to abort the export and exit", |s| {
                s.magenta().underline().to_string()
            }));
        }

        let mut frame = lines.join("\n");
        frame.push('\n');
        frame
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> String) -> String {
        if self.plain {
            text.to_string()
        } else {
            style(text)
        }
    }
}

impl<W: Write + Send> StatusRenderer for TerminalRenderer<W> {
    fn render(&mut self, view: &StatusView<'_>) {
        let frame = self.frame(view);
        let prefix = if self.plain { "" } else { CLEAR_SCREEN };

        let written = write!(self.out, "{prefix}{frame}").and_then(|()| self.out.flush());
        if let Err(e) = written {
            debug!("Failed to draw status frame: {}", e);
        }
    }
}

fn whole_minutes(elapsed: Duration) -> String {
    format!("{:.0}", elapsed.as_secs_f64() / 60.0)
}

fn started_line(started_at: DateTime<Local>) -> String {
    format!("Import started {}", started_at.format(TIME_LAYOUT))
}

fn running_line(elapsed: Duration) -> String {
    format!("and has been running for {} minutes", whole_minutes(elapsed))
}

fn finished_line(elapsed: Duration) -> String {
    format!(
        "Database exported in {} minutes. Export finished.",
        whole_minutes(elapsed)
    )
}
