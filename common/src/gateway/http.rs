//! reqwest client for the annotation backend

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{
    Gateway, ANNOTATIONS_PATH, EXPORT_CSV_PATH, IMAGES_PATH, IMPORT_CSV_PATH, PROCESS_OCR_PATH,
    SAVE_ANNOTATIONS_PATH, UPLOAD_PATH,
};
use crate::error::{Error, Result};
use crate::types::{
    normalize_ocr_response, AnnotationListing, AnnotationMap, ExportCsvRequest, FileUpload,
    ImageRef, OcrEntry, OcrRequest, SaveAck, SaveRequest, UploadResponse,
};

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` of `None` lets requests run until the backend answers
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport)?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_annotations(&self) -> Result<AnnotationListing> {
        let url = self.endpoint(ANNOTATIONS_PATH)?;
        debug!(%url, "listing annotations");
        let response = check(self.client.get(url).send().await.map_err(transport)?).await?;
        let listing: AnnotationListing = response.json().await.map_err(transport)?;
        into_listing(listing)
    }

    async fn import_csv(&self, csv: FileUpload, image_folder: &str) -> Result<AnnotationListing> {
        let url = self.endpoint(IMPORT_CSV_PATH)?;
        info!(file = %csv.file_name, image_folder, "importing CSV");
        let form = multipart::Form::new()
            .part("file", file_part(csv)?)
            .text("image_folder", image_folder.to_string());
        let response =
            check(self.client.post(url).multipart(form).send().await.map_err(transport)?).await?;
        let listing: AnnotationListing = response.json().await.map_err(transport)?;
        into_listing(listing)
    }

    async fn upload_images(&self, files: Vec<FileUpload>) -> Result<UploadResponse> {
        let url = self.endpoint(UPLOAD_PATH)?;
        info!(count = files.len(), "uploading images");
        let mut form = multipart::Form::new();
        for file in files {
            form = form.part("files", file_part(file)?);
        }
        let response =
            check(self.client.post(url).multipart(form).send().await.map_err(transport)?).await?;
        response.json().await.map_err(transport)
    }

    async fn process_ocr(&self, request: &OcrRequest) -> Result<AnnotationMap> {
        let url = self.endpoint(PROCESS_OCR_PATH)?;
        info!(images = request.image_filenames.len(), "requesting OCR");
        let response =
            check(self.client.post(url).json(request).send().await.map_err(transport)?).await?;
        let raw: BTreeMap<ImageRef, OcrEntry> = response.json().await.map_err(transport)?;
        Ok(normalize_ocr_response(raw))
    }

    async fn save_annotations(&self, request: &SaveRequest) -> Result<SaveAck> {
        let url = self.endpoint(SAVE_ANNOTATIONS_PATH)?;
        debug!(image = ?request.image(), "saving annotation");
        let response =
            check(self.client.post(url).json(request).send().await.map_err(transport)?).await?;
        let ack: SaveAck = response.json().await.map_err(transport)?;
        match ack.error {
            Some(message) => Err(Error::Backend(message)),
            None => Ok(ack),
        }
    }

    async fn export_csv(&self, request: &ExportCsvRequest) -> Result<Vec<u8>> {
        let url = self.endpoint(EXPORT_CSV_PATH)?;
        debug!(rows = request.annotations.len(), "exporting CSV");
        let response =
            check(self.client.post(url).json(request).send().await.map_err(transport)?).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn fetch_image(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let url = self.image_url(image);
        let response = check(self.client.get(&url).send().await.map_err(transport)?).await?;
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    fn image_url(&self, image: &ImageRef) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(IMAGES_PATH).push(image.as_str());
        }
        url.to_string()
    }
}

/// Base URLs are treated as directories so endpoint paths join below them
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).map_err(|e| Error::Config(format!("invalid backend URL {raw}: {e}")))
}

fn file_part(file: FileUpload) -> Result<multipart::Part> {
    let part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
    match file.mime {
        Some(mime) => part.mime_str(&mime).map_err(transport),
        None => Ok(part),
    }
}

fn into_listing(listing: AnnotationListing) -> Result<AnnotationListing> {
    match listing.error {
        Some(message) => Err(Error::Backend(message)),
        None => Ok(listing.normalized()),
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(http_error(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status"),
        &body,
    ))
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: serde_json::Value,
}

/// Status error, with the backend's `detail` message appended when it sent one
fn http_error(status: u16, reason: &str, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorDetail>(body)
        .ok()
        .and_then(|d| match d.detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
    let reason = match detail {
        Some(detail) if !detail.is_empty() => format!("{reason} ({detail})"),
        _ => reason.to_string(),
    };
    Error::Http { status, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DEFAULT_BACKEND_URL;

    #[test]
    fn test_default_endpoints() {
        let gateway = HttpGateway::new(DEFAULT_BACKEND_URL).unwrap();
        assert_eq!(
            gateway.endpoint(ANNOTATIONS_PATH).unwrap().as_str(),
            "http://localhost:8000/annotations/"
        );
        assert_eq!(
            gateway.endpoint(PROCESS_OCR_PATH).unwrap().as_str(),
            "http://localhost:8000/process-ocr/"
        );
    }

    #[test]
    fn test_base_url_with_prefix() {
        let gateway = HttpGateway::new("http://example.org:9000/ocr").unwrap();
        assert_eq!(
            gateway.endpoint(SAVE_ANNOTATIONS_PATH).unwrap().as_str(),
            "http://example.org:9000/ocr/save-annotations/"
        );
        assert_eq!(
            gateway.image_url(&"a.png".into()),
            "http://example.org:9000/ocr/images/a.png"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(HttpGateway::new("not a url"), Err(Error::Config(_))));
    }

    #[test]
    fn test_image_url_encodes_name() {
        let gateway = HttpGateway::new(DEFAULT_BACKEND_URL).unwrap();
        assert_eq!(
            gateway.image_url(&"page 1.png".into()),
            "http://localhost:8000/images/page%201.png"
        );
        assert_eq!(
            gateway.image_url(&"a/b.png".into()),
            "http://localhost:8000/images/a%2Fb.png"
        );
    }

    #[test]
    fn test_http_error_with_detail() {
        let err = http_error(500, "Internal Server Error", r#"{"detail": "CSV must contain 'image_filename' column."}"#);
        assert_eq!(
            err.to_string(),
            "500 Internal Server Error (CSV must contain 'image_filename' column.)"
        );
    }

    #[test]
    fn test_http_error_without_detail() {
        let err = http_error(404, "Not Found", "<html>nope</html>");
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn test_listing_error_field() {
        let listing = AnnotationListing {
            error: Some("boom".into()),
            ..Default::default()
        };
        assert!(matches!(into_listing(listing), Err(Error::Backend(m)) if m == "boom"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let gateway = HttpGateway::with_timeout("http://127.0.0.1:9", Some(Duration::from_secs(5))).unwrap();
        let err = gateway.list_annotations().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
