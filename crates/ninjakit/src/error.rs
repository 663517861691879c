//! Error types for provisioning operations.
//!
//! Every failure of the engine surfaces as one [`Error`]. Errors are grouped
//! into [`ErrorCategory`] values so the front end can print a short
//! description and a piece of advice next to the message.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of provisioning errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The tool catalog could not be decoded.
    Manifest,
    /// No download matches the node's platform.
    Platform,
    /// Network-related errors.
    Network,
    /// Archive or payload format error.
    Format,
    /// Misconfigured installation or job.
    Configuration,
    /// Permission denied while installing.
    Permission,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient.
    ///
    /// The engine never retries on its own; a retry is a re-run of the build.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Manifest => "Malformed tool manifest",
            Self::Platform => "Unsupported platform",
            Self::Network => "Network connectivity issue",
            Self::Format => "Invalid archive format",
            Self::Configuration => "Configuration error",
            Self::Permission => "Permission denied",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Manifest => "Refresh the tool manifest or check the manifest source",
            Self::Platform => "Pick a tool version that publishes a download for this node",
            Self::Network => "Check the node's internet connection and re-run the build",
            Self::Format => "The downloaded archive may be corrupted, re-run the build",
            Self::Configuration => "Review the ninja installations and the job configuration",
            Self::Permission => "Check permissions of the tool installation directory",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while resolving and provisioning the tool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog payload could not be decoded.
    #[error("malformed tool manifest: {0}")]
    MalformedManifest(String),

    /// No manifest variant matches the node's platform.
    #[error("{tool} on {node}: no tool download known for OS `{os}` and arch `{arch}`")]
    Unsupported {
        /// Manifest tool id.
        tool: String,
        /// Node the tool was requested for.
        node: String,
        /// Raw OS name reported by the node.
        os: String,
        /// Raw architecture reported by the node.
        arch: String,
    },

    /// Fetching or unpacking a download failed.
    #[error("failed to install {url}: {message}")]
    TransferFailed {
        /// Download URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The downloaded archive could not be unpacked.
    #[error("archive error: {0}")]
    Archive(String),

    /// Installation or job configuration is invalid.
    #[error("{0}")]
    Configuration(String),

    /// A request dispatched to a node failed.
    #[error("node {node}: {message}")]
    Node {
        /// Node name.
        node: String,
        /// Error message.
        message: String,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a transfer error for a download URL.
    pub fn transfer(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::TransferFailed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedManifest(_) => ErrorCategory::Manifest,
            Error::Unsupported { .. } => ErrorCategory::Platform,
            Error::TransferFailed { .. } | Error::Http { .. } => ErrorCategory::Network,
            Error::Archive(_) => ErrorCategory::Format,
            Error::Configuration(_) => ErrorCategory::Configuration,
            Error::Node { .. } => ErrorCategory::Other,
            Error::Io { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    ErrorCategory::Permission
                } else {
                    ErrorCategory::Other
                }
            }
        }
    }

    /// Whether this error is typically transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.category().is_transient()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_transient() {
        assert!(ErrorCategory::Network.is_transient());
        assert!(!ErrorCategory::Manifest.is_transient());
        assert!(!ErrorCategory::Platform.is_transient());
        assert!(!ErrorCategory::Configuration.is_transient());
        assert!(!ErrorCategory::Format.is_transient());
    }

    #[test]
    fn test_error_category_description_and_advice() {
        for category in [
            ErrorCategory::Manifest,
            ErrorCategory::Platform,
            ErrorCategory::Network,
            ErrorCategory::Format,
            ErrorCategory::Configuration,
            ErrorCategory::Permission,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }

    #[test]
    fn test_unsupported_message_names_everything() {
        let err = Error::Unsupported {
            tool: "1.10.0".to_string(),
            node: "agent-7".to_string(),
            os: "SunOS".to_string(),
            arch: "sparcv9".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("1.10.0"));
        assert!(display.contains("agent-7"));
        assert!(display.contains("SunOS"));
        assert!(display.contains("sparcv9"));
        assert_eq!(err.category(), ErrorCategory::Platform);
    }

    #[test]
    fn test_transfer_error_category() {
        let err = Error::transfer("https://example.com/ninja.zip", "connection reset");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_transient());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_from_ureq_status() {
        let err: Error = ureq::Error::StatusCode(502).into();
        match &err {
            Error::Http { message, status } => {
                assert_eq!(message, "HTTP 502");
                assert_eq!(*status, Some(502));
            }
            _ => panic!("Expected Error::Http"),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn test_io_permission_denied_category() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let err = Error::io("/opt/tools", io_err);
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_io_other_category() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = Error::io("/opt/tools", io_err);
        assert_eq!(err.category(), ErrorCategory::Other);
    }

    #[test]
    fn test_configuration_message_is_verbatim() {
        let err = Error::Configuration("Ninja installation requires a name".to_string());
        assert_eq!(err.to_string(), "Ninja installation requires a name");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
