//! Error handling across the CLI crate

use odia_ocr_annotator::error::AnnotatorError;
use odia_ocr_annotator::scanner;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Scanning a folder that does not exist
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"), false);

    let err = result.unwrap_err();
    assert!(matches!(err, AnnotatorError::FolderNotFound(_)));
}

/// An empty folder is not an error
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = scanner::scan_folder(dir.path(), false);

    assert!(result.unwrap().is_empty());
}

#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("dataset.csv"), "image_filename").unwrap();

    let result = scanner::scan_folder(dir.path(), true);
    assert!(result.unwrap().is_empty());
}

#[test]
fn test_collect_missing_file() {
    let err = scanner::collect_images(&[PathBuf::from("/nonexistent/page.png")], false).unwrap_err();
    assert!(matches!(err, AnnotatorError::FileNotFound(_)));
}

#[test]
fn test_error_display() {
    let errors = vec![
        AnnotatorError::Config("bad timeout".to_string()),
        AnnotatorError::FileNotFound("page.jpg".to_string()),
        AnnotatorError::FolderNotFound("/scans".to_string()),
        AnnotatorError::NoImagesFound("scans".to_string()),
        AnnotatorError::UnknownImage("page.jpg".to_string()),
        AnnotatorError::ImageProcessing("truncated".to_string()),
        AnnotatorError::Session("OCR processing failed: 500 Internal Server Error".to_string()),
        AnnotatorError::Prompt("not a terminal".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "empty message: {:?}", err);
    }
}

/// The session's validation message reaches the CLI unchanged
#[test]
fn test_missing_api_key_message() {
    let err: AnnotatorError = odia_annotator_common::Error::MissingApiKey.into();

    assert_eq!(err.to_string(), "Please enter your Gemini API Key");
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: AnnotatorError = io_err.into();

    assert!(matches!(err, AnnotatorError::Io(_)));
    assert!(err.to_string().contains("IO"));
}

#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: AnnotatorError = json_err.into();

    assert!(matches!(err, AnnotatorError::JsonParse(_)));
}

/// Common errors pass their message through unchanged
#[test]
fn test_common_error_transparent() {
    let common_err = odia_annotator_common::Error::NoValidImages;
    let err: AnnotatorError = common_err.into();

    assert!(matches!(err, AnnotatorError::Common(_)));
    assert_eq!(err.to_string(), "No valid images found in the CSV file");
}
