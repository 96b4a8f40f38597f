// Error types shared by the library. The binary wraps these in
// `anyhow` at the edges, the library itself always returns `Result`.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstapostError>;

#[derive(Error, Debug)]
pub enum InstapostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Media container creation failed: {0}")]
    MediaContainer(ApiFailure),

    #[error("Publishing failed: {0}")]
    Publish(ApiFailure),

    #[error("Container status check failed: {0}")]
    StatusCheck(ApiFailure),

    #[error("Publishing limit check failed: {0}")]
    PublishingLimit(ApiFailure),

    #[error("Image composition failed: {0}")]
    Compose(#[from] ComposeError),
}

impl InstapostError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstapostError::InvalidArgument(_) => 3,
            InstapostError::Authentication(_) => 2,
            _ => 1,
        }
    }

    /// Raw response body of the failed remote call, when one was received.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            InstapostError::MediaContainer(f)
            | InstapostError::Publish(f)
            | InstapostError::StatusCheck(f)
            | InstapostError::PublishingLimit(f) => f.body(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Why a call to the Graph API did not produce the expected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The request never got a response (DNS, TLS, timeout, ...).
    Transport(String),
    /// The server answered with a non-2xx status.
    Status { status: u16, body: String },
    /// The body was not a JSON object.
    Decode { body: String },
    /// The JSON object lacked the field that signals success.
    MissingField { field: &'static str, body: String },
}

impl ApiFailure {
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiFailure::Transport(_) => None,
            ApiFailure::Status { body, .. }
            | ApiFailure::Decode { body }
            | ApiFailure::MissingField { body, .. } => Some(body),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Transport(msg) => write!(f, "request error: {}", msg),
            ApiFailure::Status { status, body } => write!(f, "HTTP {} - {}", status, body),
            ApiFailure::Decode { body } => write!(f, "response is not valid JSON: {}", body),
            ApiFailure::MissingField { field, body } => {
                write!(f, "response has no '{}': {}", field, body)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid font file: {0}")]
    Font(String),

    #[error("Invalid text color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("Missing compose setting: {0}")]
    MissingSetting(&'static str),
}
