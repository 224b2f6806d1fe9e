use thiserror::Error;

/// Failure to read one input workbook. Recorded per file; never aborts a run.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Error reading Excel file: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Error processing {sheet} sheet: {reason}")]
    Sheet { sheet: String, reason: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

/// Failure to write a report artifact.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
