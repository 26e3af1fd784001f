use thiserror::Error;

/// Errors that can occur while reading or writing worksheets.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Worksheet already exists: {name}")]
    WorksheetExists { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(String),
}

impl DashboardError {
    /// True for failures that came from talking to the spreadsheet backend.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            DashboardError::Http(_)
                | DashboardError::Api { .. }
                | DashboardError::MalformedResponse(_)
                | DashboardError::WorksheetExists { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
