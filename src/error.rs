use thiserror::Error;

/// Failures visible to whoever asked for an analysis.
///
/// Everything that can go wrong after the snapshot exists (unreadable files,
/// a dead or confused narrative service) is absorbed further down and never
/// shows up here.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid repository locator: {0}")]
    InvalidInput(String),

    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("repository requires authentication: {0}")]
    AuthRequired(String),

    #[error("snapshot conflict: {0}")]
    Conflict(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AnalyzeError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Short machine-readable code, used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::AuthRequired(_) => "auth_required",
            Self::Conflict(_) => "conflict",
            Self::Transport(_) => "transport",
            Self::Io { .. } => "io",
        }
    }
}

impl From<reqwest::Error> for AnalyzeError {
    fn from(err: reqwest::Error) -> Self {
        AnalyzeError::Transport(err.to_string())
    }
}

impl From<zip::result::ZipError> for AnalyzeError {
    fn from(err: zip::result::ZipError) -> Self {
        AnalyzeError::Transport(format!("archive is unreadable: {}", err))
    }
}

/// Failures of the narrative-generation service. Never leaves the reconciler.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NarrativeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NarrativeError::Timeout { seconds: 0 }
        } else if err.is_connect() {
            NarrativeError::Network(format!("connection failed: {}", err))
        } else if err.is_decode() {
            NarrativeError::InvalidResponse(err.to_string())
        } else {
            NarrativeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NarrativeError {
    fn from(err: serde_json::Error) -> Self {
        NarrativeError::InvalidResponse(format!("JSON parse error: {}", err))
    }
}

/// Failures while writing a finished report to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export path: {0}")]
    InvalidPath(String),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_and_codes() {
        let err = AnalyzeError::invalid_input("must start with https://github.com/");
        assert_eq!(
            err.to_string(),
            "invalid repository locator: must start with https://github.com/"
        );
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(AnalyzeError::Conflict("x".into()).code(), "conflict");

        let err = NarrativeError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: AnalyzeError = io.into();
        assert_eq!(err.code(), "io");
    }
}
