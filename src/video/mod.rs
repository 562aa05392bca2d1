pub mod report;
pub mod ytdlp;

use std::path::Path;

use async_trait::async_trait;
pub use report::ProgressAdapter;
pub use ytdlp::YtDlpEngine;

/// What a download engine reports while it works.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Found(String),
    /// Percentage in 0..=100.
    Progress(f64),
    Completed,
    Warning(String),
    Error(String),
}

pub trait EventSink {
    fn on_event(&mut self, event: Event);

    /// Free-text engine output that carries no structured event.
    fn on_line(&mut self, level: log::Level, line: &str) {
        if let Some(event) = report::classify(level, line) {
            self.on_event(event);
        }
    }
}

#[async_trait]
pub trait Engine {
    /// Download `url` into `output_dir`, reporting through `sink`.
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        sink: &mut (dyn EventSink + Send),
    ) -> anyhow::Result<()>;
}
