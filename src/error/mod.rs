use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The unified error type for every Screenpack stage
///
/// All variants are fatal: a run that produces one of these writes no
/// metadata artifact.
#[derive(Error, Debug)]
pub enum ScreenpackError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Missing input: {}", .path.display())]
    MissingInput {
        code: u16,
        path: PathBuf,
    },

    #[error("[E{code:04}] Malformed input {}: {message}", .path.display())]
    MalformedInput {
        code: u16,
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Write failed for {}: {message}", .path.display())]
    Write {
        code: u16,
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Encoding error: {message}")]
    Encoding {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ScreenpackError {
    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a missing-input error for a required file
    pub fn missing_input(path: impl AsRef<Path>) -> Self {
        Self::MissingInput {
            code: ErrorCode::INPUT_MISSING,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a malformed-input error with default code
    pub fn malformed(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::malformed_with_code(ErrorCode::INPUT_MALFORMED, path, message)
    }

    /// Create a malformed-input error with specific code
    pub fn malformed_with_code(
        code: u16,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedInput {
            code,
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a write error with default code
    pub fn write(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::write_with_code(ErrorCode::OUTPUT_WRITE_FAILED, path, message)
    }

    /// Create a write error with specific code
    pub fn write_with_code(code: u16, path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Write {
            code,
            path: path.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an encoding error with specific code
    pub fn encoding_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Encoding {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::MalformedInput { source: src, .. }
            | Self::Write { source: src, .. }
            | Self::Encoding { source: src, .. } => {
                *src = Some(source.into());
            }
            Self::MissingInput { .. } => {}
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::MissingInput { code, .. }
            | Self::MalformedInput { code, .. }
            | Self::Write { code, .. }
            | Self::Encoding { code, .. } => *code,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::MissingInput { .. } | Self::MalformedInput { .. } => 3,
            Self::Write { .. } => 4,
            Self::Encoding { .. } => 5,
        }
    }

    /// Short description of this error's code
    pub fn description(&self) -> &'static str {
        describe_error_code(self.code())
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::MissingInput { path, .. } => {
                format!("Required input file not found: {}", path.display())
            }
            Self::MalformedInput { path, message, .. } => {
                format!("Could not understand {}: {}", path.display(), message)
            }
            Self::Write { path, message, .. } => {
                format!("Could not write {}: {}", path.display(), message)
            }
            Self::Encoding { message, .. } => format!("Encoding failed: {}", message),
        }
    }
}

/// Type alias for Results using ScreenpackError
pub type Result<T> = std::result::Result<T, ScreenpackError>;
