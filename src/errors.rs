use scenmeta_core::errors::CriteriaError;
use thiserror::Error;

/// Error type for pipeline runs.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("No {0} path configured")]
    MissingPath(&'static str),
    #[error("Unsupported output format '{0}'. Use .xlsx or .csv")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, PipelineError>`.
pub type PipelineResult<T> = Result<T, PipelineError>;
