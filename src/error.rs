//! Error types for camready library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for camready operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting and repairing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required external tool is not installed.
    #[error("Missing dependency: {0} not found on PATH")]
    MissingDependency(String),

    /// An input file (source document or template) does not exist.
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Text could not be decoded with any configured encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// An external process failed, timed out or could not be spawned.
    #[error("{program} failed: {message}")]
    Process {
        /// Program that was invoked
        program: String,
        /// Captured diagnostic output or failure reason
        message: String,
    },

    /// Error reading media from the source document archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error talking to the AI correction service.
    #[error("AI correction error: {0}")]
    Ai(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a process error for the given program.
    pub fn process(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Process {
            program: program.into(),
            message: message.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(e) => Error::Io(e),
            None => Error::Other("filesystem loop detected".into()),
        }
    }
}

#[cfg(feature = "ai")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Ai(err.to_string())
    }
}
