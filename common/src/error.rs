//! Error types shared by the session, gateway and export code

use thiserror::Error;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Please enter your Gemini API Key")]
    MissingApiKey,

    #[error("Please select at least one image")]
    EmptySelection,

    #[error("No valid images found in the CSV file")]
    NoValidImages,

    #[error("No image selected")]
    NoCurrentImage,

    #[error("Image index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Another request is still in progress")]
    Busy,

    /// Non-success HTTP status from the backend
    #[error("{status} {reason}")]
    Http { status: u16, reason: String },

    /// Connection or body-transfer failure
    #[error("{0}")]
    Transport(String),

    /// HTTP success carrying an `error` field
    #[error("{0}")]
    Backend(String),

    #[error("Export error: {0}")]
    Export(String),
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(Error::MissingApiKey.to_string(), "Please enter your Gemini API Key");
        assert_eq!(Error::EmptySelection.to_string(), "Please select at least one image");
        assert_eq!(Error::NoValidImages.to_string(), "No valid images found in the CSV file");
    }

    #[test]
    fn test_http_display() {
        let error = Error::Http { status: 500, reason: "Internal Server Error".into() };
        assert_eq!(error.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }
}
