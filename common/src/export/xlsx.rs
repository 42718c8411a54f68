//! XLSX export of the annotation dataset

use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use super::DATASET_COLUMNS;
use crate::error::{Error, Result};
use crate::types::{AnnotationMap, ImageRef};

const SHEET_NAME: &str = "annotations";

/// Workbook with one row per image in review order
pub fn annotations_to_xlsx(images: &[ImageRef], annotations: &AnnotationMap) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin);
    let text_format = Format::new().set_text_wrap();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(export_error)?;

    for (col, title) in DATASET_COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *title, &header_format)
            .map_err(export_error)?;
    }
    worksheet.set_column_width(0, 28).map_err(export_error)?;
    worksheet.set_column_width(1, 60).map_err(export_error)?;
    worksheet.set_column_width(2, 60).map_err(export_error)?;

    for (index, image) in images.iter().enumerate() {
        let row = index as u32 + 1;
        let record = annotations.get(image);
        worksheet.write_string(row, 0, image.as_str()).map_err(export_error)?;
        worksheet
            .write_string_with_format(
                row,
                1,
                record.map(|r| r.extracted_text.as_str()).unwrap_or(""),
                &text_format,
            )
            .map_err(export_error)?;
        worksheet
            .write_string_with_format(
                row,
                2,
                record.map(|r| r.validated_text.as_str()).unwrap_or(""),
                &text_format,
            )
            .map_err(export_error)?;
    }

    workbook.save_to_buffer().map_err(export_error)
}

fn export_error(err: rust_xlsxwriter::XlsxError) -> Error {
    Error::Export(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnnotationRecord;

    #[test]
    fn test_xlsx_is_zip() {
        let mut annotations = AnnotationMap::new();
        annotations.insert("a.png".into(), AnnotationRecord::new("ଅ", "ଆ"));
        let bytes = annotations_to_xlsx(&["a.png".into()], &annotations).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_xlsx_empty_dataset() {
        let bytes = annotations_to_xlsx(&[], &AnnotationMap::new()).unwrap();
        assert!(!bytes.is_empty());
    }
}
