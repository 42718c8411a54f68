//! Read an image for upload, optionally shrinking oversized scans

use super::ImageFile;
use crate::error::{AnnotatorError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use odia_annotator_common::FileUpload;
use std::io::Cursor;
use tracing::debug;

/// Load `file` into an upload part. With `max_size`, images whose longer
/// side exceeds it are downscaled and re-encoded in their own format.
pub fn prepare_upload(file: &ImageFile, max_size: Option<u32>) -> Result<FileUpload> {
    let mut upload = FileUpload::from_path(&file.path)?;
    let Some(max_size) = max_size else {
        return Ok(upload);
    };

    let format = ImageFormat::from_path(&file.path)
        .map_err(|e| AnnotatorError::ImageProcessing(format!("{}: {e}", file.file_name)))?;
    let image = image::load_from_memory_with_format(&upload.bytes, format)
        .map_err(|e| AnnotatorError::ImageProcessing(format!("{}: {e}", file.file_name)))?;

    let (width, height) = image.dimensions();
    if width.max(height) <= max_size {
        return Ok(upload);
    }

    let resized = image.resize(max_size, max_size, FilterType::Lanczos3);
    debug!(
        file = %file.file_name,
        from = ?(width, height),
        to = ?resized.dimensions(),
        "downscaled before upload"
    );
    upload.bytes = encode(resized, format)
        .map_err(|e| AnnotatorError::ImageProcessing(format!("{}: {e}", file.file_name)))?;
    Ok(upload)
}

fn encode(image: DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    // JPEG has no alpha channel
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), format)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::tempdir;

    fn write_png(path: &std::path::Path, width: u32, height: u32) {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, Rgb([200, 10, 10]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_no_limit_keeps_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.png");
        write_png(&path, 40, 20);
        let original = std::fs::read(&path).unwrap();

        let upload = prepare_upload(&ImageFile::from_path(&path), None).unwrap();
        assert_eq!(upload.bytes, original);
        assert_eq!(upload.file_name, "page.png");
        assert_eq!(upload.mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_downscales_large_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.png");
        write_png(&path, 400, 200);

        let upload = prepare_upload(&ImageFile::from_path(&path), Some(100)).unwrap();
        let resized = image::load_from_memory(&upload.bytes).unwrap();
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_small_image_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_png(&path, 50, 50);
        let original = std::fs::read(&path).unwrap();

        let upload = prepare_upload(&ImageFile::from_path(&path), Some(100)).unwrap();
        assert_eq!(upload.bytes, original);
    }
}
