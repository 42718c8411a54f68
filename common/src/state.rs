//! Annotation session state
//!
//! All reviewer-visible data lives in [`SessionState`]. Backend operations
//! are split into a `begin_*`/`complete_*` pair around the network call so
//! the same transitions serve the async session, the desktop view and the
//! tests. A failed transition leaves everything but `last_error` untouched.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gate::{RequestGate, RequestPermit};
use crate::types::{
    AnnotationListing, AnnotationMap, AnnotationRecord, ExportCsvRequest, ImageRef, OcrRequest,
    SaveAck, SaveRequest, UploadResponse,
};

/// Backend operation a failure is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListAnnotations,
    ImportCsv,
    Upload,
    Ocr,
    Save,
    ExportCsv,
    FetchImage,
}

impl RequestKind {
    /// Leading text of the message shown in the error banner
    pub fn failure_prefix(self) -> &'static str {
        match self {
            RequestKind::ListAnnotations => "Failed to load annotations",
            RequestKind::ImportCsv => "Failed to load CSV",
            RequestKind::Upload => "Failed to upload images",
            RequestKind::Ocr => "OCR processing failed",
            RequestKind::Save => "Failed to save annotations",
            RequestKind::ExportCsv => "Failed to export CSV",
            RequestKind::FetchImage => "Failed to load image",
        }
    }
}

#[derive(Debug)]
pub struct SessionState {
    images: Vec<ImageRef>,
    selected_images: Vec<ImageRef>,
    current_index: usize,
    annotations: AnnotationMap,
    text_buffer: String,
    api_key: String,
    last_error: Option<String>,
    selector_open: bool,
    keyboard_enabled: bool,
    gate: RequestGate,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            selected_images: Vec::new(),
            current_index: 0,
            annotations: AnnotationMap::new(),
            text_buffer: String::new(),
            api_key: String::new(),
            last_error: None,
            selector_open: false,
            keyboard_enabled: true,
            gate: RequestGate::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accessors ----

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn selected_images(&self) -> &[ImageRef] {
        &self.selected_images
    }

    /// Offset of the image under review, `None` while nothing is loaded
    pub fn current_index(&self) -> Option<usize> {
        (!self.images.is_empty()).then_some(self.current_index)
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        self.images.get(self.current_index)
    }

    pub fn current_record(&self) -> Option<&AnnotationRecord> {
        self.current_image().and_then(|image| self.annotations.get(image))
    }

    pub fn annotations(&self) -> &AnnotationMap {
        &self.annotations
    }

    pub fn annotation(&self, image: &ImageRef) -> Option<&AnnotationRecord> {
        self.annotations.get(image)
    }

    pub fn text_buffer(&self) -> &str {
        &self.text_buffer
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn selector_open(&self) -> bool {
        self.selector_open
    }

    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    // ---- local edits ----

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    /// Restrict the next OCR run to `images`; names not loaded are ignored
    pub fn set_selected_images(&mut self, images: Vec<ImageRef>) {
        self.selected_images = images
            .into_iter()
            .filter(|image| self.images.contains(image))
            .collect();
    }

    pub fn toggle_selector(&mut self) {
        self.selector_open = !self.selector_open;
    }

    /// Informational only; keyboard clicks insert glyphs either way
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn insert_character(&mut self, ch: &str) {
        self.text_buffer.push_str(ch);
    }

    pub fn edit_text(&mut self, value: impl Into<String>) {
        self.text_buffer = value.into();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    // ---- navigation ----

    pub fn select_image(&mut self, index: usize) -> Result<()> {
        if index >= self.images.len() {
            return Err(self.reject(Error::IndexOutOfRange {
                index,
                len: self.images.len(),
            }));
        }
        self.selector_open = false;
        self.set_current(index);
        Ok(())
    }

    /// Returns `false` at the last image
    pub fn move_next(&mut self) -> bool {
        let next = self.current_index + 1;
        if next >= self.images.len() {
            return false;
        }
        self.selector_open = false;
        self.set_current(next);
        true
    }

    /// Returns `false` at the first image
    pub fn move_previous(&mut self) -> bool {
        if self.images.is_empty() || self.current_index == 0 {
            return false;
        }
        self.selector_open = false;
        self.set_current(self.current_index - 1);
        true
    }

    fn set_current(&mut self, index: usize) {
        self.current_index = index;
        self.text_buffer = self
            .current_record()
            .map(|record| record.extracted_text.clone())
            .unwrap_or_default();
    }

    // ---- request lifecycle ----

    /// Take the session's in-flight slot before a backend call
    pub fn acquire(&mut self, kind: RequestKind) -> Result<RequestPermit> {
        match self.gate.try_acquire() {
            Some(permit) => {
                debug!(?kind, "request admitted");
                Ok(permit)
            }
            None => {
                warn!(?kind, "request rejected, another one is in flight");
                Err(self.reject(Error::Busy))
            }
        }
    }

    /// Show `detail` in the banner, prefixed with the failed operation
    pub fn report_failure(&mut self, kind: RequestKind, detail: &dyn fmt::Display) {
        let message = format!("{}: {}", kind.failure_prefix(), detail);
        warn!("{message}");
        self.last_error = Some(message);
    }

    pub fn record_failure(&mut self, kind: RequestKind, err: Error) -> Error {
        self.report_failure(kind, &err);
        err
    }

    fn reject(&mut self, err: Error) -> Error {
        self.last_error = Some(err.to_string());
        err
    }

    pub fn complete_initialize(&mut self, outcome: Result<AnnotationListing>) -> Result<()> {
        let listing = outcome.map_err(|e| self.record_failure(RequestKind::ListAnnotations, e))?;
        debug!(images = listing.valid_images.len(), "session hydrated");

        self.selected_images = listing.valid_images.clone();
        self.images = listing.valid_images;
        if self.current_index >= self.images.len() {
            self.current_index = 0;
        }
        self.last_error = None;
        Ok(())
    }

    /// Add stored annotations without touching the image list
    pub fn merge_annotations(&mut self, annotations: AnnotationMap) {
        self.annotations.extend(annotations);
        if !self.images.is_empty() {
            self.set_current(self.current_index);
        }
    }

    pub fn complete_import(&mut self, outcome: Result<AnnotationListing>) -> Result<()> {
        let listing = outcome.map_err(|e| self.record_failure(RequestKind::ImportCsv, e))?;
        if listing.valid_images.is_empty() {
            return Err(self.reject(Error::NoValidImages));
        }
        if !listing.missing_images.is_empty() {
            warn!(missing = listing.missing_images.len(), "CSV rows without an image file");
        }

        self.selected_images = listing.valid_images.clone();
        self.images = listing.valid_images;
        self.current_index = 0;
        self.selector_open = false;
        match listing.annotations {
            Some(annotations) => {
                self.text_buffer = annotations
                    .get(&self.images[0])
                    .map(|record| record.validated_text.clone())
                    .unwrap_or_default();
                self.annotations = annotations;
            }
            None => self.set_current(0),
        }
        self.last_error = None;
        Ok(())
    }

    /// Append uploaded images and move to the first new one.
    /// Returns how many images the backend accepted.
    pub fn complete_upload(&mut self, outcome: Result<UploadResponse>) -> Result<usize> {
        let response = outcome.map_err(|e| self.record_failure(RequestKind::Upload, e))?;
        let appended = response.images.len();
        if appended > 0 {
            let first_new = self.images.len();
            self.images.extend(response.images.iter().cloned());
            self.selected_images.extend(response.images);
            self.selector_open = false;
            self.set_current(first_new);
        }
        self.last_error = None;
        Ok(appended)
    }

    pub fn begin_ocr(&mut self) -> Result<OcrRequest> {
        if self.api_key.is_empty() {
            return Err(self.reject(Error::MissingApiKey));
        }
        if self.selected_images.is_empty() {
            return Err(self.reject(Error::EmptySelection));
        }
        self.last_error = None;
        Ok(OcrRequest {
            api_key: self.api_key.clone(),
            image_filenames: self.selected_images.clone(),
        })
    }

    /// Replace all annotations with the OCR results
    pub fn complete_ocr(&mut self, outcome: Result<AnnotationMap>) -> Result<()> {
        let results = outcome.map_err(|e| self.record_failure(RequestKind::Ocr, e))?;
        debug!(results = results.len(), "OCR results received");

        self.annotations = results;
        if let Some(text) = self.current_record().map(|r| r.extracted_text.clone()) {
            self.text_buffer = text;
        }
        self.last_error = None;
        Ok(())
    }

    /// Payload saving the buffer as the current image's validated text
    pub fn save_request(&mut self) -> Result<SaveRequest> {
        let Some(image) = self.current_image().cloned() else {
            return Err(self.reject(Error::NoCurrentImage));
        };
        let extracted = self
            .annotations
            .get(&image)
            .map(|record| record.extracted_text.clone())
            .unwrap_or_default();
        self.last_error = None;
        Ok(SaveRequest::single(
            image,
            AnnotationRecord::new(extracted, self.text_buffer.clone()),
        ))
    }

    /// The local annotation map is left as it was; the backend holds the saved copy
    pub fn complete_save(&mut self, outcome: Result<SaveAck>) -> Result<SaveAck> {
        let ack = outcome.map_err(|e| self.record_failure(RequestKind::Save, e))?;
        self.last_error = None;
        Ok(ack)
    }

    pub fn export_request(&self) -> ExportCsvRequest {
        let mut request = ExportCsvRequest::default();
        for (image, record) in &self.annotations {
            request
                .annotations
                .insert(image.clone(), record.extracted_text.clone());
            request
                .validated_texts
                .insert(image.clone(), record.validated_text.clone());
        }
        request
    }

    pub fn complete_export(&mut self, outcome: Result<Vec<u8>>) -> Result<Vec<u8>> {
        let csv = outcome.map_err(|e| self.record_failure(RequestKind::ExportCsv, e))?;
        self.last_error = None;
        Ok(csv)
    }
}
