// Error taxonomy shared by the search engine, the upload orchestrator and the editor.
// Every variant is recoverable: callers surface it as a notification and keep their state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport or response-decoding failure against the listing API.
    #[error("Network error: {0}")]
    Network(String),
    /// Client-side precondition violated; raised before any network call.
    #[error("{0}")]
    Validation(String),
    /// One file's storage operation failed.
    #[error("Upload of '{file}' failed: {reason}")]
    Upload { file: String, reason: String },
    /// The listing requested for editing does not exist.
    #[error("Listing {0} not found")]
    NotFound(String),
    /// The listing API answered `{ success: false, message }`.
    #[error("{message}")]
    Api { message: String },
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Text shown to the user for this error.
    pub fn notice(&self) -> String {
        match self {
            ClientError::Network(_) => "A network error occurred. Please try again.".to_string(),
            ClientError::Upload { .. } => UPLOAD_FAILED_NOTICE.to_string(),
            other => other.to_string(),
        }
    }
}

pub const UPLOAD_FAILED_NOTICE: &str = "Image upload failed (2 mb max per image)";

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Network(format!("invalid response body: {}", error))
    }
}

// Custom Result type used across the library
pub type ClientResult<T> = Result<T, ClientError>;
