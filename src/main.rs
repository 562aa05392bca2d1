mod config;
mod driver;
mod errors;
mod page;
mod video;

use driver::{DownloadOutcome, RunReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(config) = config::Config::from_args(std::env::args().skip(1)) else {
        println!("👋 Please provide a webpage URL as an argument!");
        println!("Example: video_dl https://example.com/page-with-video [output folder]");
        return Ok(());
    };

    let engine = video::YtDlpEngine::new(&config.engine);
    let mut stdout = std::io::stdout();
    let report = driver::run(&config, &engine, &mut stdout).await?;

    match report {
        RunReport::ScanFailed(e) => log::warn!("Scan of {} failed: {e:?}", config.page_url),
        RunReport::NoVideos => log::info!("Nothing to download from {}", config.page_url),
        RunReport::Finished(outcomes) => {
            for outcome in outcomes {
                match outcome {
                    DownloadOutcome::Saved { url } => log::info!("Saved: {url}"),
                    DownloadOutcome::Failed { url, cause } => log::warn!("Failed: {url}: {cause}"),
                }
            }
        }
    }
    Ok(())
}
