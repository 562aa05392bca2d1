use std::path::PathBuf;

pub const USER_AGENT: &str = "Mozilla/5.0";
pub const VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const BAR_WIDTH: usize = 40;
const ENGINE_PROGRAM: &str = "yt-dlp";

pub struct Config {
    pub page_url: String,
    pub output_dir: PathBuf,
    pub engine: PathBuf,
}

impl Config {
    /// Build from positional arguments: `<page url> [output dir]`.
    /// `None` when the page URL is missing.
    pub fn from_args<I>(mut args: I) -> Option<Config>
    where
        I: Iterator<Item = String>,
    {
        let page_url = args.next().filter(|url| !url.trim().is_empty())?;
        let output_dir = args.next().map_or_else(default_output_dir, PathBuf::from);
        Some(Config {
            page_url,
            output_dir,
            engine: PathBuf::from(ENGINE_PROGRAM),
        })
    }
}

pub fn default_output_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("Videos"))
}
