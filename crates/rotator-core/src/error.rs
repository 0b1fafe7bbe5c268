use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config directory not found: set HOME or pass --config")]
    ConfigDirNotFound,

    #[error("auto-start entry error: {0}")]
    Autostart(String),

    #[error("rotation task is no longer running")]
    RotatorGone,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the remote avatar API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed [{status}]: {url} - {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cookie did not authenticate")]
    NotAuthenticated,
}

impl ApiError {
    /// True when the request never got an HTTP response (DNS, connect, timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RotatorError>;
