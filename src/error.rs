use thiserror::Error;

/// Error surfaced by the `grid` binary; carries the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised while talking to the provider.
///
/// Everything except [`FetchError::FixtureMissing`] is absorbed at the tier
/// boundary of the acquisition chain and turned into an empty tier.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network failure, timeout, or unreadable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Malformed delimited text or unexpected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Fixture mode is on and no fixture matches the requested call.
    #[error("fixture not found: {0}")]
    FixtureMissing(String),
}

impl FetchError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::FixtureMissing(_))
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::new(4, err.to_string())
    }
}
