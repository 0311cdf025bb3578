use std::fmt;

/// Errors that can occur while pinning or resolving content.
#[derive(Debug)]
pub enum PinError {
    /// The HTTP request to the pinning service failed.
    Transport(reqwest::Error),
    /// The pinning service returned a non-success status.
    Rejected { status: u16, detail: String },
    /// The pinning service answered with an unparseable body.
    InvalidResponse(String),
    /// The returned content id failed validation.
    InvalidContentId(String),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "pinning transport error: {err}"),
            Self::Rejected { status, detail } => {
                write!(f, "pinning service rejected upload (HTTP {status}): {detail}")
            }
            Self::InvalidResponse(msg) => write!(f, "invalid pinning response: {msg}"),
            Self::InvalidContentId(msg) => write!(f, "invalid content id: {msg}"),
        }
    }
}

impl std::error::Error for PinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PinError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}
