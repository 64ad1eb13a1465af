use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageGenError {
    /// A required setting is missing. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport failure or a non-success HTTP status.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered with a body we could not interpret.
    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Feed error: {0}")]
    FeedError(String),
}

impl From<reqwest::Error> for ImageGenError {
    fn from(err: reqwest::Error) -> Self {
        ImageGenError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for ImageGenError {
    fn from(err: serde_json::Error) -> Self {
        ImageGenError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImageGenError>;
