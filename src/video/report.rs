use std::{io::Write, path::Path};

use log::Level;

use crate::{
    config::BAR_WIDTH,
    video::{Event, EventSink},
};

const FOUND_MARKER: &str = "[download] Downloading video";
const COMPLETED_MARKER: &str = "[download] Download completed";
const PROGRESS_MARKER: &str = "[download]";

/// Map one line of engine log text to an event. First match wins.
pub fn classify(level: Level, line: &str) -> Option<Event> {
    match level {
        Level::Debug | Level::Trace => None,
        Level::Warn => Some(Event::Warning(line.to_owned())),
        Level::Error => Some(Event::Error(line.to_owned())),
        Level::Info => {
            if line.contains(FOUND_MARKER) {
                line.split('"').nth(1).map(|title| Event::Found(title.to_owned()))
            } else if line.contains(COMPLETED_MARKER) {
                Some(Event::Completed)
            } else if line.contains(PROGRESS_MARKER) && line.contains('%') {
                line.split_whitespace()
                    .nth(1)
                    .and_then(|token| token.replace('%', "").parse::<f64>().ok())
                    .map(Event::Progress)
            } else {
                None
            }
        }
    }
}

/// Turns engine events into terminal feedback. One per download.
pub struct ProgressAdapter<W: Write> {
    out: W,
    destination: String,
    title: Option<String>,
}

impl<W: Write> ProgressAdapter<W> {
    pub fn new(out: W, destination: &Path) -> Self {
        ProgressAdapter {
            out,
            destination: destination.display().to_string(),
            title: None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn draw_bar(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let filled = ((BAR_WIDTH as f64) * percent / 100.0).floor() as usize;
        let bar = "█".repeat(filled) + &"▒".repeat(BAR_WIDTH - filled);
        // Redraw in place
        let _ = write!(self.out, "\r⏳ Downloading: |{bar}| {percent:.1}%");
        let _ = self.out.flush();
    }
}

impl<W: Write> EventSink for ProgressAdapter<W> {
    fn on_event(&mut self, event: Event) {
        match event {
            Event::Found(title) => {
                let _ = writeln!(self.out, "\n🎥 Found video: {title}");
                let _ = writeln!(self.out, "⏳ Starting download...");
                self.title = Some(title);
            }
            Event::Progress(percent) => self.draw_bar(percent),
            Event::Completed => {
                let title = self.title.as_deref().unwrap_or("video");
                let _ = writeln!(
                    self.out,
                    "\n✅ Successfully saved '{title}' to {}!",
                    self.destination
                );
            }
            Event::Warning(text) => {
                if text.to_lowercase().contains("video id") {
                    log::debug!("Suppressed warning: {text}");
                    return;
                }
                let _ = writeln!(self.out, "⚠️  {text}");
            }
            Event::Error(text) => {
                let _ = writeln!(self.out, "❌ Oops! Something went wrong: {text}");
            }
        }
    }
}
