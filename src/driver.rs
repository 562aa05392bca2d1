use std::{io::Write, path::Path};

use crate::{
    config::Config,
    errors, page,
    video::{Engine, ProgressAdapter},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { url: String },
    Failed { url: String, cause: String },
}

#[derive(Debug)]
pub enum RunReport {
    ScanFailed(errors::ScanError),
    NoVideos,
    Finished(Vec<DownloadOutcome>),
}

impl RunReport {
    pub fn saved(&self) -> usize {
        match self {
            RunReport::Finished(outcomes) => outcomes
                .iter()
                .filter(|o| matches!(o, DownloadOutcome::Saved { .. }))
                .count(),
            RunReport::ScanFailed(_) | RunReport::NoVideos => 0,
        }
    }
}

/// Download one URL. Engine failures are reported, never propagated.
///
/// # Errors
///
/// Only when `out` cannot be written.
pub async fn download_one<E, W>(
    engine: &E,
    url: &str,
    output_dir: &Path,
    out: &mut W,
) -> std::io::Result<DownloadOutcome>
where
    E: Engine + ?Sized,
    W: Write + Send,
{
    let result = {
        let mut adapter = ProgressAdapter::new(&mut *out, output_dir);
        let result = engine.download(url, output_dir, &mut adapter).await;
        if result.is_ok() {
            log::info!("Finished {url} ({})", adapter.title().unwrap_or("untitled"));
        }
        result
    };
    // Separate the progress bar from whatever comes next
    writeln!(out)?;
    let outcome = match result {
        Ok(()) => DownloadOutcome::Saved {
            url: url.to_owned(),
        },
        Err(e) => {
            log::warn!("Download of {url} failed: {e:?}");
            writeln!(out, "❌ Couldn't download the video: {e}")?;
            DownloadOutcome::Failed {
                url: url.to_owned(),
                cause: e.to_string(),
            }
        }
    };
    Ok(outcome)
}

/// Download every URL in order; a failed download does not stop the rest.
///
/// # Errors
///
/// Only when `out` cannot be written.
pub async fn download_all<E, W>(
    engine: &E,
    urls: &[String],
    output_dir: &Path,
    out: &mut W,
) -> std::io::Result<Vec<DownloadOutcome>>
where
    E: Engine + ?Sized,
    W: Write + Send,
{
    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        outcomes.push(download_one(engine, url, output_dir, out).await?);
    }
    Ok(outcomes)
}

/// Scan the configured page and download what it links to.
///
/// # Errors
///
/// Only when the output directory cannot be created or `out` cannot be written.
pub async fn run<E, W>(config: &Config, engine: &E, out: &mut W) -> anyhow::Result<RunReport>
where
    E: Engine + ?Sized,
    W: Write + Send,
{
    writeln!(out, "🎬 Video Downloader Starting Up!")?;
    writeln!(out, "--------------------------------")?;

    std::fs::create_dir_all(&config.output_dir)?;
    writeln!(out, "📁 Videos will be saved to: {}", config.output_dir.display())?;
    writeln!(out)?;

    writeln!(out, "🔍 Scanning webpage for videos...")?;
    let urls = match page::scan(&config.page_url).await {
        Ok(urls) => urls,
        Err(e) => {
            writeln!(out, "❌ Couldn't access the webpage: {e}")?;
            return Ok(RunReport::ScanFailed(e));
        }
    };
    if urls.is_empty() {
        writeln!(out, "😕 No videos found on this page.")?;
        return Ok(RunReport::NoVideos);
    }
    writeln!(out, "✨ Found {} {}!", urls.len(), plural(urls.len()))?;

    writeln!(out, "\n🚀 Starting downloads...")?;
    let report = RunReport::Finished(download_all(engine, &urls, &config.output_dir, out).await?);

    writeln!(
        out,
        "\n✨ All done! Saved {} of {} {} to {}.",
        report.saved(),
        urls.len(),
        plural(urls.len()),
        config.output_dir.display()
    )?;
    Ok(report)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "video"
    } else {
        "videos"
    }
}
