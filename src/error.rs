use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Malformed result: {message}")]
    MalformedResult { message: String },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

impl PanelError {
    /// The text shown on the panel for errors that reach the user.
    pub fn user_message(&self) -> String {
        match self {
            PanelError::Configuration { message }
            | PanelError::Backend { message }
            | PanelError::MalformedResult { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
