use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use log::Level;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::Command,
};

use crate::{
    config, errors,
    video::{Engine, Event, EventSink},
};

const FOUND_HOOK: &str = "[found] ";
const SAVED_HOOK: &str = "[saved] ";
const PROGRESS_HOOK: &str = "[progress] ";

/// Runs the `yt-dlp` program, one process per URL.
pub struct YtDlpEngine {
    program: PathBuf,
}

impl YtDlpEngine {
    pub fn new(program: &Path) -> Self {
        YtDlpEngine {
            program: program.to_path_buf(),
        }
    }

    fn args(url: &str, output_dir: &Path) -> Vec<String> {
        vec![
            "-f".to_owned(),
            config::VIDEO_FORMAT.to_owned(),
            "-o".to_owned(),
            output_dir
                .join(config::OUTPUT_TEMPLATE)
                .to_string_lossy()
                .into_owned(),
            "--newline".to_owned(),
            "--no-colors".to_owned(),
            // --print implies --quiet, keep the progress lines anyway
            "--progress".to_owned(),
            "--no-simulate".to_owned(),
            "--print".to_owned(),
            format!("before_dl:{FOUND_HOOK}%(title)j"),
            "--print".to_owned(),
            format!("after_move:{SAVED_HOOK}%(filepath)j"),
            "--progress-template".to_owned(),
            format!(
                "download:{PROGRESS_HOOK}%(progress.{{status,downloaded_bytes,total_bytes,total_bytes_estimate}})j"
            ),
            // Page URLs are data, never options
            "--".to_owned(),
            url.to_owned(),
        ]
    }
}

/// Decode a hook line printed through one of our templates.
fn parse_hook(line: &str) -> Option<Event> {
    if let Some(rest) = line.strip_prefix(FOUND_HOOK) {
        let title = json::parse(rest).ok()?;
        return title.as_str().map(|t| Event::Found(t.to_owned()));
    }
    if let Some(rest) = line.strip_prefix(SAVED_HOOK) {
        let path = json::parse(rest).ok()?;
        log::info!("Saved video file: {}", path.as_str().unwrap_or_default());
        return Some(Event::Completed);
    }
    if let Some(rest) = line.strip_prefix(PROGRESS_HOOK) {
        let progress = json::parse(rest).ok()?;
        let downloaded = progress["downloaded_bytes"].as_f64()?;
        let total = progress["total_bytes"]
            .as_f64()
            .or_else(|| progress["total_bytes_estimate"].as_f64())
            .filter(|total| *total > 0.0)?;
        return Some(Event::Progress(downloaded / total * 100.0));
    }
    None
}

/// Next line without its terminator, decoded lossily. `None` at end of stream.
/// Bytes read before a cancelled call stay in `buf` and are picked up by the next one.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    reader.read_until(b'\n', buf).await?;
    if buf.is_empty() {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\r', '\n'])
        .to_owned();
    buf.clear();
    Ok(Some(line))
}

/// yt-dlp writes warnings and errors to stderr with a level prefix.
fn stderr_level(line: &str) -> (Level, &str) {
    if let Some(rest) = line.strip_prefix("WARNING:") {
        (Level::Warn, rest.trim_start())
    } else if let Some(rest) = line.strip_prefix("ERROR:") {
        (Level::Error, rest.trim_start())
    } else if line.starts_with("[debug]") {
        (Level::Debug, line)
    } else {
        (Level::Info, line)
    }
}

fn dispatch(line: &str, from_stderr: bool, sink: &mut (dyn EventSink + Send)) {
    log::debug!("yt-dlp> {line}");
    if let Some(event) = parse_hook(line) {
        sink.on_event(event);
    } else if from_stderr {
        let (level, text) = stderr_level(line);
        sink.on_line(level, text);
    } else {
        sink.on_line(Level::Info, line);
    }
}

#[async_trait]
impl Engine for YtDlpEngine {
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        sink: &mut (dyn EventSink + Send),
    ) -> anyhow::Result<()> {
        log::info!("Downloading {url} with {}", self.program.display());
        let mut child = Command::new(&self.program)
            .args(YtDlpEngine::args(url, output_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| errors::DownloadError::Spawn(self.program.display().to_string(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or(errors::DownloadError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(errors::DownloadError::MissingPipe("stderr"))?;
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut stdout_buf, mut stderr_buf) = (Vec::new(), Vec::new());

        let (mut stdout_done, mut stderr_done) = (false, false);
        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = next_line(&mut stdout, &mut stdout_buf), if !stdout_done => match line? {
                    Some(line) => dispatch(&line, false, sink),
                    None => stdout_done = true,
                },
                line = next_line(&mut stderr, &mut stderr_buf), if !stderr_done => match line? {
                    Some(line) => dispatch(&line, true, sink),
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(errors::DownloadError::EngineExit(status).into());
        }
        Ok(())
    }
}
