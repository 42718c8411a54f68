//! Local dataset export through the CLI helpers

use chrono::{Local, TimeZone};
use odia_annotator_common::{AnnotationMap, AnnotationRecord, ImageRef};
use odia_ocr_annotator::cli::ExportFormat;
use odia_ocr_annotator::export::{output_path_for_format, render, write_export};
use tempfile::tempdir;

fn dataset() -> (Vec<ImageRef>, AnnotationMap) {
    let images: Vec<ImageRef> = ["page_01.png", "page_02.png", "page_03.png"]
        .into_iter()
        .map(ImageRef::from)
        .collect();
    let mut annotations = AnnotationMap::new();
    annotations.insert("page_01.png".into(), AnnotationRecord::new("ଓଡ଼ିଆ", "ଓଡ଼ିଆ ଭାଷା"));
    annotations.insert("page_03.png".into(), AnnotationRecord::new("line one\nline two", "a, \"b\""));
    (images, annotations)
}

#[test]
fn test_csv_export_to_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let (images, annotations) = dataset();
    let now = Local.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();

    let bytes = render(ExportFormat::Csv, &images, &annotations).unwrap();
    let path = output_path_for_format(Some(dir.path()), ExportFormat::Csv, now);
    write_export(&path, &bytes).unwrap();

    assert_eq!(path.file_name().unwrap(), "annotations_20260105_080000.csv");
    let content = std::fs::read_to_string(&path).unwrap();
    let content = content.trim_start_matches('\u{feff}');
    assert!(content.starts_with("image_filename,extracted_text,validated_text\n"));
    assert!(content.contains("page_01.png,ଓଡ଼ିଆ,ଓଡ଼ିଆ ଭାଷା\n"));
    assert!(content.contains("page_02.png,,\n"));
    assert!(content.contains("page_03.png,\"line one\nline two\",\"a, \"\"b\"\"\"\n"));
}

#[test]
fn test_xlsx_export_is_zip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let (images, annotations) = dataset();

    let bytes = render(ExportFormat::Xlsx, &images, &annotations).unwrap();
    let path = dir.path().join("dataset.xlsx");
    write_export(&path, &bytes).unwrap();

    let written = std::fs::read(&path).unwrap();
    assert!(written.len() > 100);
    assert_eq!(&written[..2], b"PK");
}

#[test]
fn test_empty_export_has_header_only() {
    let bytes = render(ExportFormat::Csv, &[], &AnnotationMap::new()).unwrap();
    let content = String::from_utf8(bytes).unwrap();
    assert_eq!(content.lines().count(), 1);
}
