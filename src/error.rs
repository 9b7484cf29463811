use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid value for {key}: {value:?}")]
    Config { key: String, value: String },

    #[error("Push channel error: {0}")]
    PushChannel(String),
}

impl ClientError {
    /// True when the backend refused the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Backend { status: 401 | 403, .. })
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::PushChannel(err.to_string())
    }
}
