use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Malformed payload: {0}")]
    Parse(String),

    #[error("Invalid share link: {0}")]
    Decode(String),

    #[error("Cloud connection failed: {0}")]
    SyncConnect(String),

    #[error("Cloud push failed: {0}")]
    Push(String),

    #[error("Local storage write failed: {0}")]
    Quota(String),
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        PortfolioError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for PortfolioError {
    fn from(err: std::io::Error) -> Self {
        PortfolioError::Quota(err.to_string())
    }
}
