use thiserror::Error;

pub type Result<T> = std::result::Result<T, PageDriverError>;

#[derive(Debug, Error)]
pub enum PageDriverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for PageDriverError {
    fn from(err: reqwest::Error) -> Self {
        PageDriverError::Network(err.to_string())
    }
}
