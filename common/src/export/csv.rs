//! CSV export in the backend's dataset layout

use super::DATASET_COLUMNS;
use crate::types::{AnnotationMap, ImageRef};

/// Excel only detects UTF-8 CSV with a byte order mark
const UTF8_BOM: &str = "\u{feff}";

/// Render `images` in review order; images without a record get empty text columns
pub fn annotations_to_csv(images: &[ImageRef], annotations: &AnnotationMap) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str(&DATASET_COLUMNS.join(","));
    out.push('\n');

    for image in images {
        let record = annotations.get(image);
        let fields = [
            image.as_str(),
            record.map(|r| r.extracted_text.as_str()).unwrap_or(""),
            record.map(|r| r.validated_text.as_str()).unwrap_or(""),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains a separator, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
