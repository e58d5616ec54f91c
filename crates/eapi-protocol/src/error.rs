//! Typed failures for eAPI exchanges.
//!
//! Three kinds are distinguished: an unsupported result encoding (rejected
//! before any I/O), a transport-level failure (the device could not be
//! reached or replied with something undecodable), and a command failure
//! (the device explicitly reported a protocol error). Connection and
//! command failures carry the offending command batch once the caller-facing
//! entry point attaches it.

use thiserror::Error;

/// A specialized `Result` for eAPI operations.
pub type EapiResult<T> = std::result::Result<T, EapiError>;

/// Failure reported by the device for a command batch.
///
/// Carries the numeric protocol error code and text from the response's
/// `error` member.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error [{code}]: {text}")]
pub struct CommandError {
    /// Numeric error code from the eAPI response.
    pub code: i64,
    /// Error text that coincides with the code.
    pub text: String,
    /// The command batch that produced the failure, attached by `execute`.
    pub commands: Option<Vec<String>>,
}

impl CommandError {
    /// Create a command error from a response's `error` member.
    pub fn new(code: i64, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            commands: None,
        }
    }
}

/// Failure to complete an exchange with the device.
///
/// Raised when the transport cannot be opened, written, or read, or when the
/// response body does not decode as an eAPI envelope. `connection_type` is
/// the identity string of the binding that failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ConnectionError {
    /// Identity string of the transport binding that raised the error.
    pub connection_type: String,
    /// Human-readable error message.
    pub message: String,
    /// The command batch in flight when the failure occurred, attached by
    /// `execute`.
    pub commands: Option<Vec<String>>,
    /// The underlying cause, retained for inspection.
    pub detail: Option<String>,
}

impl ConnectionError {
    /// Create a connection error attributed to the given transport identity.
    pub fn new(connection_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            connection_type: connection_type.into(),
            message: message.into(),
            commands: None,
            detail: None,
        }
    }

    /// Retain the underlying cause for inspection.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Any failure an eAPI call can surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EapiError {
    /// The caller asked for a result encoding outside `{json, text}`.
    /// Rejected before any I/O occurs.
    #[error("encoding must be one of [json, text], got '{0}'")]
    UnsupportedEncoding(String),

    /// The device reported a command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The device could not be reached or its reply was undecodable.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl EapiError {
    /// The command batch attached to this failure, if any.
    pub fn commands(&self) -> Option<&[String]> {
        match self {
            Self::UnsupportedEncoding(_) => None,
            Self::Command(e) => e.commands.as_deref(),
            Self::Connection(e) => e.commands.as_deref(),
        }
    }

    /// Attach the command batch that was in flight when this error was
    /// raised. No-op for validation errors, which never reach the wire.
    pub fn set_commands(&mut self, commands: Vec<String>) {
        match self {
            Self::UnsupportedEncoding(_) => {}
            Self::Command(e) => e.commands = Some(commands),
            Self::Connection(e) => e.commands = Some(commands),
        }
    }

    /// The command failure, when this is one.
    pub fn as_command(&self) -> Option<&CommandError> {
        match self {
            Self::Command(e) => Some(e),
            _ => None,
        }
    }

    /// The connection failure, when this is one.
    pub fn as_connection(&self) -> Option<&ConnectionError> {
        match self {
            Self::Connection(e) => Some(e),
            _ => None,
        }
    }
}
