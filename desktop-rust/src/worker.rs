//! Background gateway calls for the UI thread
//!
//! Every call runs on the tokio runtime and reports back through a channel
//! the app drains once per frame. Request messages carry the permit they
//! were admitted with, so the session stays busy until the UI has applied
//! the result.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use eframe::egui;
use odia_annotator_common::{
    AnnotationListing, AnnotationMap, FileUpload, Gateway, ImageRef, OcrRequest,
    RequestPermit, SaveAck, SaveRequest, UploadResponse,
};
use tokio::runtime::Handle;

const THUMB_SIZE: u32 = 48;
const MAX_VIEW_SIZE: u32 = 1600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Thumb,
    Full,
}

pub struct DecodedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

pub enum UiMessage {
    Listed {
        outcome: odia_annotator_common::Result<AnnotationListing>,
        permit: RequestPermit,
    },
    Imported {
        outcome: odia_annotator_common::Result<AnnotationListing>,
        permit: RequestPermit,
    },
    Uploaded {
        outcome: odia_annotator_common::Result<UploadResponse>,
        permit: RequestPermit,
    },
    Processed {
        outcome: odia_annotator_common::Result<AnnotationMap>,
        permit: RequestPermit,
    },
    Saved {
        outcome: odia_annotator_common::Result<SaveAck>,
        permit: RequestPermit,
    },
    Image {
        image: ImageRef,
        kind: ImageKind,
        decoded: Result<DecodedImage>,
    },
}

#[derive(Clone)]
pub struct Worker {
    gateway: Arc<dyn Gateway>,
    runtime: Handle,
    tx: Sender<UiMessage>,
    ctx: egui::Context,
}

impl Worker {
    pub fn new(gateway: Arc<dyn Gateway>, runtime: Handle, tx: Sender<UiMessage>, ctx: egui::Context) -> Self {
        Self { gateway, runtime, tx, ctx }
    }

    fn spawn<F, Fut>(&self, job: F)
    where
        F: FnOnce(Arc<dyn Gateway>) -> Fut,
        Fut: std::future::Future<Output = UiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let task = job(Arc::clone(&self.gateway));
        self.runtime.spawn(async move {
            let message = task.await;
            // the receiver is gone once the window closed
            let _ = tx.send(message);
            ctx.request_repaint();
        });
    }

    pub fn list_annotations(&self, permit: RequestPermit) {
        self.spawn(move |gateway| async move {
            let outcome = gateway.list_annotations().await;
            UiMessage::Listed { outcome, permit }
        });
    }

    pub fn import_csv(&self, path: PathBuf, image_folder: String, permit: RequestPermit) {
        self.spawn(move |gateway| async move {
            let outcome = match FileUpload::from_path(&path) {
                Ok(file) => gateway.import_csv(file, &image_folder).await,
                Err(err) => Err(err),
            };
            UiMessage::Imported { outcome, permit }
        });
    }

    pub fn upload_images(&self, paths: Vec<PathBuf>, permit: RequestPermit) {
        self.spawn(move |gateway| async move {
            let files: odia_annotator_common::Result<Vec<FileUpload>> =
                paths.iter().map(|path| FileUpload::from_path(path)).collect();
            let outcome = match files {
                Ok(files) => gateway.upload_images(files).await,
                Err(err) => Err(err),
            };
            UiMessage::Uploaded { outcome, permit }
        });
    }

    pub fn process_ocr(&self, request: OcrRequest, permit: RequestPermit) {
        self.spawn(move |gateway| async move {
            let outcome = gateway.process_ocr(&request).await;
            UiMessage::Processed { outcome, permit }
        });
    }

    pub fn save_annotations(&self, request: SaveRequest, permit: RequestPermit) {
        self.spawn(move |gateway| async move {
            let outcome = gateway.save_annotations(&request).await;
            UiMessage::Saved { outcome, permit }
        });
    }

    /// Image fetches bypass the request gate, like an `<img>` tag would
    pub fn fetch_image(&self, image: ImageRef, kind: ImageKind) {
        self.spawn(move |gateway| async move {
            let decoded = match gateway.fetch_image(&image).await {
                Ok(bytes) => tokio::task::spawn_blocking(move || decode(&bytes, kind))
                    .await
                    .context("decoder task failed")
                    .and_then(|decoded| decoded),
                Err(err) => Err(err.into()),
            };
            UiMessage::Image { image, kind, decoded }
        });
    }
}

fn decode(bytes: &[u8], kind: ImageKind) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes).context("unsupported image data")?;
    let image = match kind {
        ImageKind::Thumb => image.thumbnail(THUMB_SIZE, THUMB_SIZE),
        ImageKind::Full if image.width().max(image.height()) > MAX_VIEW_SIZE => {
            image.thumbnail(MAX_VIEW_SIZE, MAX_VIEW_SIZE)
        }
        ImageKind::Full => image,
    };
    let size = [image.width() as usize, image.height() as usize];
    Ok(DecodedImage {
        size,
        pixels: image.to_rgba8().into_raw(),
    })
}
