//! Odia OCR annotation common library
//!
//! Shared by the CLI and the desktop viewer: the data model, the session
//! state transitions, the virtual keyboard and the backend gateway.

pub mod error;
pub mod export;
pub mod gate;
pub mod gateway;
pub mod keyboard;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use gate::{RequestGate, RequestPermit};
pub use gateway::{Gateway, DEFAULT_BACKEND_URL};
#[cfg(feature = "http")]
pub use gateway::HttpGateway;
pub use keyboard::{glyph_for, transliterate, KeyCell, KEYBOARD, SPACE_KEY};
pub use state::{RequestKind, SessionState};
pub use types::{
    is_supported_image, AnnotationListing, AnnotationMap, AnnotationRecord, ExportCsvRequest,
    FileUpload, ImageRef, OcrRequest, SaveAck, SaveRequest, UploadResponse,
    DEFAULT_IMAGE_FOLDER, SUPPORTED_IMAGE_TYPES,
};
