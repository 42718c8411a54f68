use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No supported images found in: {0}")]
    NoImagesFound(String),

    #[error("Image not loaded in the backend: {0}")]
    UnknownImage(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// Failure already formatted for the reviewer
    #[error("{0}")]
    Session(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] odia_annotator_common::Error),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
