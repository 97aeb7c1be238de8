use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocfillError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Missing dependency: {0} support is not available")]
    MissingDependency(String),

    #[error("Failed to read document: {0}")]
    ReadError(String),

    #[error("Failed to write document: {0}")]
    WriteError(String),
}

impl DocfillError {
    /// Stable machine-readable code, used by the HTTP shell
    pub fn code(&self) -> &'static str {
        match self {
            DocfillError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            DocfillError::MissingDependency(_) => "MISSING_DEPENDENCY",
            DocfillError::ReadError(_) => "READ_ERROR",
            DocfillError::WriteError(_) => "WRITE_ERROR",
        }
    }
}
