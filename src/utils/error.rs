use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("GDAL error: {message}")]
    DriverError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Malformed metadata: {message}")]
    MalformedMetadata { message: String },

    #[error("Engine initialization failed: {message}")]
    EngineError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Engine,
    Metadata,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Affects a single layer; the run continues.
    Low,
    Medium,
    High,
    /// Nothing can be processed.
    Critical,
}

impl ExtractError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExtractError::DriverError { .. } | ExtractError::EngineError { .. } => {
                ErrorCategory::Engine
            }
            ExtractError::XmlError(_) | ExtractError::MalformedMetadata { .. } => {
                ErrorCategory::Metadata
            }
            ExtractError::IoError(_) => ErrorCategory::Storage,
            ExtractError::ConfigValidationError { .. }
            | ExtractError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Metadata => ErrorSeverity::Low,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Engine => match self {
                ExtractError::EngineError { .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::Medium,
            },
        }
    }

    /// Whether the payload itself could not be read as XML.
    pub fn is_malformed_metadata(&self) -> bool {
        self.category() == ErrorCategory::Metadata
    }

    /// The message without the variant's own prefix, for report lines that
    /// already name the failure.
    pub fn reason(&self) -> String {
        match self {
            ExtractError::MalformedMetadata { message } => message.clone(),
            ExtractError::XmlError(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Engine => {
                "Check the GDAL installation and that the requested vector driver is available"
            }
            ErrorCategory::Metadata => "Inspect the layer's .xml sidecar for invalid markup",
            ErrorCategory::Storage => {
                "Make sure the output directory exists and is writable"
            }
            ErrorCategory::Configuration => "Review the command-line flags and config file",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_is_critical() {
        let err = ExtractError::EngineError {
            message: "driver missing".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Engine);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_malformed_metadata_is_contained() {
        let err = ExtractError::MalformedMetadata {
            message: "unclosed element".to_string(),
        };
        assert!(err.is_malformed_metadata());
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Malformed metadata: unclosed element");
        assert_eq!(err.reason(), "unclosed element");
    }

    #[test]
    fn test_io_error_category() {
        let err: ExtractError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert!(!err.is_malformed_metadata());
    }
}
