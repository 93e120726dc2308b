use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not connected to the attendance store")]
    NotConnected,

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Failed to sign token request: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Request to the attendance store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Attendance store responded with {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Spreadsheet '{0}' not found")]
    StoreNotFound(String),

    #[error("Malformed store response: {0}")]
    Malformed(String),
}
