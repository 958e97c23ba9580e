use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("No disciplines found in transcript")]
    NoRecordsFound,

    #[error("Discipline record {id} not found")]
    RecordNotFound { id: u64 },

    #[error("Invalid edit: {message}")]
    InvalidEdit { message: String },

    #[error("Unsupported input file: {path}")]
    UnsupportedInput { path: String },

    #[error("PDF extraction failed: {message}")]
    PdfError { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Extraction,
    Editing,
    Configuration,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::UnsupportedInput { .. } | EtlError::PdfError { .. } => ErrorCategory::Input,
            EtlError::NoRecordsFound => ErrorCategory::Extraction,
            EtlError::RecordNotFound { .. } | EtlError::InvalidEdit { .. } => {
                ErrorCategory::Editing
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ZipError(_)
            | EtlError::CsvError(_)
            | EtlError::IoError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::RecordNotFound { .. } => ErrorSeverity::Low,
            EtlError::NoRecordsFound | EtlError::PdfError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::NoRecordsFound => {
                "Make sure the file is the full academic transcript and not a scanned image"
            }
            EtlError::RecordNotFound { .. } => "Check the record id against the current list",
            EtlError::InvalidEdit { .. } => "Grades must be between 0 and 10",
            EtlError::UnsupportedInput { .. } => "Provide a .pdf transcript or a .txt text dump",
            EtlError::PdfError { .. } => {
                "Export the transcript text with pdftotext and pass the .txt file instead"
            }
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Review the configuration file and flags",
            EtlError::IoError(_) => "Check that the paths exist and are writable",
            EtlError::ZipError(_) | EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Retry with a different output format"
            }
            EtlError::ProcessingError { .. } => "Request json or csv output",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::NoRecordsFound => "No disciplines were found in the transcript.".to_string(),
            EtlError::UnsupportedInput { path } => {
                format!("The file '{}' is not a supported transcript format.", path)
            }
            EtlError::PdfError { .. } => "The PDF text could not be read.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
