//! Annotation backend gateway
//!
//! The backend stores images, runs OCR and persists annotations. Every
//! call the session makes goes through [`Gateway`] so views and tests can
//! swap the HTTP client for something else.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpGateway;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AnnotationListing, AnnotationMap, ExportCsvRequest, FileUpload, ImageRef, OcrRequest, SaveAck,
    SaveRequest, UploadResponse,
};

/// Backend address used when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const ANNOTATIONS_PATH: &str = "annotations/";
pub const IMPORT_CSV_PATH: &str = "import-csv/";
pub const UPLOAD_PATH: &str = "upload/";
pub const PROCESS_OCR_PATH: &str = "process-ocr/";
pub const SAVE_ANNOTATIONS_PATH: &str = "save-annotations/";
pub const EXPORT_CSV_PATH: &str = "export-csv/";
pub const IMAGES_PATH: &str = "images";

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Images and annotations already known to the backend
    async fn list_annotations(&self) -> Result<AnnotationListing>;

    /// Load a dataset CSV, resolving its image names against `image_folder`
    async fn import_csv(&self, csv: FileUpload, image_folder: &str) -> Result<AnnotationListing>;

    async fn upload_images(&self, files: Vec<FileUpload>) -> Result<UploadResponse>;

    /// Run OCR; the response is normalized to one record per image
    async fn process_ocr(&self, request: &OcrRequest) -> Result<AnnotationMap>;

    async fn save_annotations(&self, request: &SaveRequest) -> Result<SaveAck>;

    /// CSV bytes of the backend's annotation file
    async fn export_csv(&self, request: &ExportCsvRequest) -> Result<Vec<u8>>;

    async fn fetch_image(&self, image: &ImageRef) -> Result<Vec<u8>>;

    /// Address an image can be displayed from
    fn image_url(&self, image: &ImageRef) -> String;
}
