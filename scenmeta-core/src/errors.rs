use thiserror::Error;

/// Error type for criteria evaluation and dataset operations.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("{0}")]
    Error(String),
    #[error("Expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
    #[error("Invalid configuration for `{parameter}`: {reason}")]
    InvalidConfiguration { parameter: String, reason: String },
    #[error("No data for variable '{variable}' in year {year}. Check the criterion '{criterion}' for a configuration error")]
    MissingYear {
        criterion: String,
        variable: String,
        year: i32,
    },
    #[error("Duplicate data row for {0}")]
    DuplicateKey(String),
    #[error("Index collision when concatenating results: {0}")]
    IndexCollision(String),
    #[error("Concatenated length {actual} does not match the sum of input lengths {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Criterion '{criterion}' produced {count} values for model '{model}', scenario '{scenario}'. Filter to a single region before building metadata")]
    AmbiguousReduction {
        criterion: String,
        model: String,
        scenario: String,
        count: usize,
    },
    #[error("Could not parse unit '{unit}': {details}")]
    UnitParse { unit: String, details: String },
    #[error("Cannot convert from '{from}' to '{to}'")]
    IncompatibleUnits { from: String, to: String },
    #[error("Invalid input table: {0}")]
    InvalidTable(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, CriteriaError>`.
pub type CriteriaResult<T> = Result<T, CriteriaError>;
