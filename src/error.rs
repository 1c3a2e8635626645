use thiserror::Error;

/// Failures surfaced to the user. Each one ends the triggering command; the
/// application stays usable for the next one.
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetching or decoding the source failed. The dataset is left empty.
    #[error("Failed to load spreadsheet: {0:#}")]
    Load(anyhow::Error),

    /// Filter form submitted without a primary column or operation columns.
    #[error("Please enter the primary column and at least one operation column.")]
    MissingInput,

    #[error("{0} downloads are not implemented yet.")]
    UnsupportedFormat(&'static str),

    /// Serialising or writing the export failed.
    #[error("Failed to export: {0:#}")]
    Export(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
