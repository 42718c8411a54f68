use crate::cli::ExportFormat;
use crate::error::Result;
use chrono::{DateTime, Local};
use odia_annotator_common::export::csv::annotations_to_csv;
use odia_annotator_common::export::xlsx::annotations_to_xlsx;
use odia_annotator_common::{AnnotationMap, ImageRef};
use std::path::{Path, PathBuf};

const FILE_STEM: &str = "annotations";

/// Resolve where an export is written. Directories (or paths without an
/// extension) get a timestamped file name inside them.
pub fn output_path_for_format(
    output: Option<&Path>,
    format: ExportFormat,
    now: DateTime<Local>,
) -> PathBuf {
    let file_name = format!(
        "{}_{}.{}",
        FILE_STEM,
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

pub fn render(
    format: ExportFormat,
    images: &[ImageRef],
    annotations: &AnnotationMap,
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => Ok(annotations_to_csv(images, annotations).into_bytes()),
        ExportFormat::Xlsx => Ok(annotations_to_xlsx(images, annotations)?),
    }
}

pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use odia_annotator_common::AnnotationRecord;
    use tempfile::tempdir;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_default_output_name() {
        let path = output_path_for_format(None, ExportFormat::Csv, fixed_now());
        assert_eq!(path, PathBuf::from("annotations_20260314_092653.csv"));
    }

    #[test]
    fn test_output_into_directory() {
        let dir = tempdir().unwrap();
        let path = output_path_for_format(Some(dir.path()), ExportFormat::Xlsx, fixed_now());
        assert_eq!(path, dir.path().join("annotations_20260314_092653.xlsx"));
    }

    #[test]
    fn test_explicit_file_kept() {
        let path = output_path_for_format(Some(Path::new("out/dataset.csv")), ExportFormat::Csv, fixed_now());
        assert_eq!(path, PathBuf::from("out/dataset.csv"));
    }

    #[test]
    fn test_write_csv_export() {
        let dir = tempdir().unwrap();
        let mut annotations = AnnotationMap::new();
        annotations.insert("a.png".into(), AnnotationRecord::new("କ", "କଖ"));
        let bytes = render(ExportFormat::Csv, &["a.png".into()], &annotations).unwrap();

        let path = dir.path().join("nested").join("out.csv");
        write_export(&path, &bytes).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("a.png,କ,କଖ"));
    }
}
