use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("QR payload has no '_' separator")]
    InvalidFormat,
}

/// Identity decoded from a scanned QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    pub code: String,
    pub name: String,
}

/// Parses `CODE_FULL-NAME-WITH-DASHES`.
///
/// Only the first `_` separates code and name. Anything containing an
/// underscore is accepted, including an empty code or name.
pub fn parse(raw: &str) -> Result<ScanPayload, PayloadError> {
    let (code, name_raw) = raw.split_once('_').ok_or(PayloadError::InvalidFormat)?;

    Ok(ScanPayload {
        code: code.to_uppercase(),
        name: name_raw.replace('-', " ").to_uppercase(),
    })
}
