#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid page URL {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("Parse Failed")]
    ParseFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Failed to start {0}: {1}")]
    Spawn(String, std::io::Error),

    #[error("Missing {0} pipe")]
    MissingPipe(&'static str),

    #[error("Download engine failed ({0})")]
    EngineExit(std::process::ExitStatus),
}
