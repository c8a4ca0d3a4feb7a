use thiserror::Error;

/// Errors raised while building plots, layouts and reports.
#[derive(Debug, Error)]
pub enum AplanatError {
    #[error("Lengths of {0} should be equal")]
    LengthMismatch(String),

    #[error("No data to plot: {0}")]
    EmptyData(String),

    #[error("Unknown plot style: \"{0}\"")]
    UnknownStyle(String),

    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("Column {0} does not hold numeric data")]
    NotNumeric(String),

    #[error("The alert level must be one of danger, warning, success, or info (got {0})")]
    InvalidAlertLevel(String),

    #[error("A key is required")]
    KeyRequired,

    #[error("Placeholder `{0}` was not assigned a value")]
    UnassignedPlaceholder(String),

    #[error("Cannot create colour palette with more than 256 colours (requested {0})")]
    PaletteTooLarge(usize),

    #[error("'{0}' is not a known icon")]
    UnknownIcon(String),

    #[error("Background should be a RGB tuple or hex-colour string, got {0}")]
    InvalidColour(String),

    #[error("Step must be a positive, finite number (got {0})")]
    InvalidStep(f64),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, AplanatError>;
