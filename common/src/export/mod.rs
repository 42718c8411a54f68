//! Annotation dataset export shared by the CLI and the desktop viewer.

pub mod csv;

#[cfg(feature = "excel")]
pub mod xlsx;

/// Column order of the ground-truth dataset, matching the backend's CSV
pub const DATASET_COLUMNS: [&str; 3] = ["image_filename", "extracted_text", "validated_text"];
