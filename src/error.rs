use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("No input files found: {0}")]
    MissingInput(String),

    #[error("Required file not found: {path}\n{hint}")]
    MissingFile { path: String, hint: String },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Nothing to aggregate: {0}")]
    EmptyInput(String),

    #[error("Plot rendering error: {0}")]
    Plot(String),
}

impl ProcessingError {
    pub fn missing_file(path: &std::path::Path, hint: impl Into<String>) -> Self {
        ProcessingError::MissingFile {
            path: path.display().to_string(),
            hint: hint.into(),
        }
    }
}
