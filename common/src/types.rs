//! Data model and backend wire types
//!
//! - ImageRef: filename identifying an uploaded image
//! - AnnotationRecord: OCR output plus the reviewer's corrected text
//! - request/response bodies of the annotation backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Extensions the backend accepts on upload
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tiff"];

/// Folder name the backend resolves CSV image paths against
pub const DEFAULT_IMAGE_FOLDER: &str = "uploaded_images";

/// Filename of an uploaded image
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// OCR output and validated text for one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRecord {
    pub extracted_text: String,
    pub validated_text: String,
}

impl AnnotationRecord {
    pub fn new(extracted_text: impl Into<String>, validated_text: impl Into<String>) -> Self {
        Self {
            extracted_text: extracted_text.into(),
            validated_text: validated_text.into(),
        }
    }

    /// Record for a freshly recognized image, not yet validated
    pub fn extracted(text: impl Into<String>) -> Self {
        Self::new(text, "")
    }

    /// Drop the `nan` placeholder pandas writes for empty CSV cells
    pub fn normalized(mut self) -> Self {
        for field in [&mut self.extracted_text, &mut self.validated_text] {
            if field.trim().eq_ignore_ascii_case("nan") {
                field.clear();
            }
        }
        self
    }
}

pub type AnnotationMap = BTreeMap<ImageRef, AnnotationRecord>;

/// Response of `GET /annotations/` and `POST /import-csv/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationListing {
    pub valid_images: Vec<ImageRef>,
    pub annotations: Option<AnnotationMap>,
    pub missing_images: Vec<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnnotationListing {
    pub fn normalized(mut self) -> Self {
        if let Some(annotations) = self.annotations.take() {
            self.annotations = Some(
                annotations
                    .into_iter()
                    .map(|(image, record)| (image, record.normalized()))
                    .collect(),
            );
        }
        self
    }
}

/// Response of `POST /upload/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub status: Option<String>,
    pub images: Vec<ImageRef>,
}

/// Body of `POST /process-ocr/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrRequest {
    pub api_key: String,
    pub image_filenames: Vec<ImageRef>,
}

/// One value of the OCR response; the backend sends bare strings,
/// stored annotations come back as records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OcrEntry {
    Text(String),
    Record(AnnotationRecord),
}

impl From<OcrEntry> for AnnotationRecord {
    fn from(entry: OcrEntry) -> Self {
        match entry {
            OcrEntry::Text(text) => AnnotationRecord::extracted(text),
            OcrEntry::Record(record) => record.normalized(),
        }
    }
}

/// Normalize an OCR response to the canonical record shape
pub fn normalize_ocr_response(raw: BTreeMap<ImageRef, OcrEntry>) -> AnnotationMap {
    raw.into_iter()
        .map(|(image, entry)| (image, entry.into()))
        .collect()
}

/// Body of `POST /save-annotations/`, always exactly one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SaveRequest(BTreeMap<ImageRef, AnnotationRecord>);

impl SaveRequest {
    pub fn single(image: ImageRef, record: AnnotationRecord) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(image, record);
        Self(entries)
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.0.keys().next()
    }

    pub fn record(&self) -> Option<&AnnotationRecord> {
        self.0.values().next()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Acknowledgement of `POST /save-annotations/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveAck {
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Body of `POST /export-csv/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportCsvRequest {
    pub annotations: BTreeMap<ImageRef, String>,
    pub validated_texts: BTreeMap<ImageRef, String>,
}

/// A file picked for one multipart request
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FileUpload {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_for(&file_name).map(str::to_string);
        Ok(Self { file_name, bytes, mime })
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Whether the backend will accept this file on upload
pub fn is_supported_image(name: &str) -> bool {
    extension_of(name)
        .map(|ext| SUPPORTED_IMAGE_TYPES.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// MIME type for a supported image or a CSV file
pub fn mime_for(name: &str) -> Option<&'static str> {
    match extension_of(name)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tiff" => Some("image/tiff"),
        "csv" => Some("text/csv"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_response_mixed_shapes() {
        let json = r#"{
            "a.png": "ଅଆ",
            "b.png": {"extracted_text": "କ", "validated_text": "ଖ"}
        }"#;
        let raw: BTreeMap<ImageRef, OcrEntry> = serde_json::from_str(json).unwrap();
        let map = normalize_ocr_response(raw);

        assert_eq!(map[&ImageRef::from("a.png")], AnnotationRecord::new("ଅଆ", ""));
        assert_eq!(map[&ImageRef::from("b.png")], AnnotationRecord::new("କ", "ଖ"));
    }

    #[test]
    fn test_listing_drops_nan_placeholder() {
        let json = r#"{
            "valid_images": ["a.png"],
            "annotations": {"a.png": {"extracted_text": "ଅ", "validated_text": "nan"}},
            "missing_images": ["gone.png"]
        }"#;
        let listing: AnnotationListing = serde_json::from_str(json).unwrap();
        let listing = listing.normalized();
        let annotations = listing.annotations.unwrap();

        assert_eq!(annotations[&ImageRef::from("a.png")].validated_text, "");
        assert_eq!(annotations[&ImageRef::from("a.png")].extracted_text, "ଅ");
        assert_eq!(listing.missing_images, vec![ImageRef::from("gone.png")]);
    }

    #[test]
    fn test_listing_without_annotations() {
        let listing: AnnotationListing =
            serde_json::from_str(r#"{"valid_images": ["x.jpg", "y.jpg"]}"#).unwrap();
        assert_eq!(listing.valid_images.len(), 2);
        assert!(listing.annotations.is_none());
        assert!(listing.error.is_none());
    }

    #[test]
    fn test_save_request_single_key() {
        let request = SaveRequest::single("a.png".into(), AnnotationRecord::new("x", "y"));
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 1);
        assert_eq!(object["a.png"]["extracted_text"], "x");
        assert_eq!(object["a.png"]["validated_text"], "y");
    }

    #[test]
    fn test_supported_image_types() {
        assert!(is_supported_image("scan.JPG"));
        assert!(is_supported_image("page.tiff"));
        assert!(is_supported_image("leaf.webp"));
        assert!(!is_supported_image("notes.txt"));
        assert!(!is_supported_image("anim.gif"));
        assert!(!is_supported_image("noext"));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.jpg"), Some("image/jpeg"));
        assert_eq!(mime_for("dataset.csv"), Some("text/csv"));
        assert_eq!(mime_for("a.gif"), None);
    }
}
