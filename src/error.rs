use thiserror::Error;

use crate::fields::FieldKind;

#[derive(Error, Debug)]
pub enum StockdeskError {
    #[error(
        "invalid username or password. Please check your credentials and try again ({0})"
    )]
    InvalidCredentials(String),

    #[error("an error occurred while connecting to SharePoint: {0}")]
    Transport(String),

    #[error("item '{id}' not found in list '{list}'")]
    NotFound { list: String, id: String },

    #[error("invalid value '{value}' for {kind} field '{field}'")]
    Coercion {
        field: String,
        value: String,
        kind: FieldKind,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no credentials set; log in first")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StockdeskError {
    /// Whether the user has to re-enter their credentials to recover
    pub fn is_credentials_error(&self) -> bool {
        matches!(
            self,
            StockdeskError::InvalidCredentials(_) | StockdeskError::NotAuthenticated
        )
    }
}

impl From<reqwest::Error> for StockdeskError {
    fn from(err: reqwest::Error) -> Self {
        StockdeskError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StockdeskError>;
