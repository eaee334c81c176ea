use serde::{Deserialize, Serialize};

/// Client-facing failure categories. Every error that leaves the service maps
/// to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFileType,
    ExtractionFailure,
    ModelOutputParseFailure,
    ModelUnavailable,
    ModelTimeout,
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedFileType | Self::ExtractionFailure | Self::BadRequest => 400,
            Self::ModelOutputParseFailure => 422,
            Self::ModelUnavailable => 503,
            Self::ModelTimeout => 504,
            Self::Internal => 500,
        }
    }

    /// Whether a client may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ModelUnavailable | Self::ModelTimeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType => "unsupported_file_type",
            Self::ExtractionFailure => "extraction_failure",
            Self::ModelOutputParseFailure => "model_output_parse_failure",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelTimeout => "model_timeout",
            Self::BadRequest => "bad_request",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
