mod resize;

pub use resize::prepare_upload;

use crate::error::{AnnotatorError, Result};
use odia_annotator_common::is_supported_image;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl ImageFile {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            file_name,
        }
    }
}

/// Collect uploadable images from files and folders, keeping argument order.
/// Folder contents are sorted by file name.
pub fn collect_images(paths: &[PathBuf], recursive: bool) -> Result<Vec<ImageFile>> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path, recursive)?);
        } else if path.is_file() {
            if is_supported_image(&path.to_string_lossy()) {
                images.push(ImageFile::from_path(path));
            } else {
                warn!(path = %path.display(), "skipping unsupported file");
            }
        } else {
            return Err(AnnotatorError::FileNotFound(path.display().to_string()));
        }
    }

    Ok(images)
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ImageFile>> {
    if !folder.exists() {
        return Err(AnnotatorError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<ImageFile> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_image(&e.file_name().to_string_lossy()))
        .map(|e| ImageFile::from_path(e.path()))
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    debug!(folder = %folder.display(), count = images.len(), "folder scanned");

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(AnnotatorError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("c.png")).unwrap();
        File::create(dir.path().join("a.JPG")).unwrap();
        File::create(dir.path().join("b.tiff")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("anim.gif")).unwrap();

        let names: Vec<String> = scan_folder(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|i| i.file_name)
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.tiff", "c.png"]);
    }

    #[test]
    fn test_scan_folder_recursion() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("top.png")).unwrap();
        File::create(dir.path().join("sub").join("deep.png")).unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }

    #[test]
    fn test_collect_mixed_arguments() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("pages");
        fs::create_dir_all(&folder).unwrap();
        File::create(folder.join("p2.png")).unwrap();
        File::create(folder.join("p1.png")).unwrap();
        let single = dir.path().join("cover.jpeg");
        File::create(&single).unwrap();
        let skipped = dir.path().join("readme.md");
        File::create(&skipped).unwrap();

        let names: Vec<String> = collect_images(&[single, folder, skipped], false)
            .unwrap()
            .into_iter()
            .map(|i| i.file_name)
            .collect();
        assert_eq!(names, vec!["cover.jpeg", "p1.png", "p2.png"]);
    }

    #[test]
    fn test_collect_missing_file() {
        let result = collect_images(&[PathBuf::from("/nonexistent/page.png")], false);
        assert!(matches!(result, Err(AnnotatorError::FileNotFound(_))));
    }
}
