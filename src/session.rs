//! Async annotation session
//!
//! Couples a [`SessionState`] with a [`Gateway`]. Each operation takes the
//! in-flight slot, makes at most one backend call and applies the matching
//! state transition, so the state is always consistent when it returns.

use crate::error::Result;
use crate::scanner::{prepare_upload, ImageFile};
use odia_annotator_common::{FileUpload, Gateway, RequestKind, SaveAck, SessionState};
use std::path::Path;
use tracing::{debug, info};

pub struct AnnotationSession<G> {
    gateway: G,
    state: SessionState,
}

impl<G: Gateway> AnnotationSession<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Hydrate from the images the backend already knows
    pub async fn initialize(&mut self) -> Result<()> {
        let _permit = self.state.acquire(RequestKind::ListAnnotations)?;
        let outcome = self.gateway.list_annotations().await;
        self.state.complete_initialize(outcome)?;
        info!(images = self.state.images().len(), "session initialized");
        Ok(())
    }

    /// Like [`initialize`](Self::initialize), also loading the annotations
    /// the backend has stored for those images
    pub async fn hydrate(&mut self) -> Result<()> {
        let _permit = self.state.acquire(RequestKind::ListAnnotations)?;
        let outcome = self.gateway.list_annotations().await;
        let stored = outcome
            .as_ref()
            .ok()
            .and_then(|listing| listing.annotations.clone());
        self.state.complete_initialize(outcome)?;
        if let Some(stored) = stored {
            self.state.merge_annotations(stored);
        }
        Ok(())
    }

    pub async fn import_dataset(&mut self, csv: &Path, image_folder: &str) -> Result<()> {
        let _permit = self.state.acquire(RequestKind::ImportCsv)?;
        let file = FileUpload::from_path(csv)
            .map_err(|e| self.state.record_failure(RequestKind::ImportCsv, e))?;
        let outcome = self.gateway.import_csv(file, image_folder).await;
        self.state.complete_import(outcome)?;
        info!(images = self.state.images().len(), "dataset imported");
        Ok(())
    }

    /// Upload `files` and return how many the backend accepted
    pub async fn upload_images(&mut self, files: &[ImageFile], max_size: Option<u32>) -> Result<usize> {
        let _permit = self.state.acquire(RequestKind::Upload)?;
        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            match prepare_upload(file, max_size) {
                Ok(upload) => uploads.push(upload),
                Err(err) => {
                    self.state.report_failure(RequestKind::Upload, &err);
                    return Err(err);
                }
            }
        }
        debug!(count = uploads.len(), "files read for upload");
        let outcome = self.gateway.upload_images(uploads).await;
        let accepted = self.state.complete_upload(outcome)?;
        Ok(accepted)
    }

    pub async fn run_ocr(&mut self) -> Result<()> {
        let request = self.state.begin_ocr()?;
        let _permit = self.state.acquire(RequestKind::Ocr)?;
        let outcome = self.gateway.process_ocr(&request).await;
        self.state.complete_ocr(outcome)?;
        Ok(())
    }

    pub async fn save_current_annotation(&mut self) -> Result<SaveAck> {
        let request = self.state.save_request()?;
        let _permit = self.state.acquire(RequestKind::Save)?;
        let outcome = self.gateway.save_annotations(&request).await;
        let ack = self.state.complete_save(outcome)?;
        Ok(ack)
    }

    /// CSV the backend builds from the session's annotations
    pub async fn export_remote(&mut self) -> Result<Vec<u8>> {
        let request = self.state.export_request();
        let _permit = self.state.acquire(RequestKind::ExportCsv)?;
        let outcome = self.gateway.export_csv(&request).await;
        let csv = self.state.complete_export(outcome)?;
        Ok(csv)
    }
}
