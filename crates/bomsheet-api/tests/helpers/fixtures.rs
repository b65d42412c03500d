//! Test fixtures: cost documents, a tiny PNG and xlsx inspection.

use serde_json::{json, Value};
use std::io::{Cursor, Read};

/// One EC2 line item at $100.00 a month.
pub fn acme_bom() -> Value {
    json!({
        "Groups": {
            "Services": [{
                "Region": "us-east-1",
                "Service Name": "EC2",
                "Service Cost": {"monthly": 100.0},
                "Properties": {"Instance type": "t3.micro"}
            }]
        }
    })
}

/// Minimal valid 1x1 RGBA PNG bytes.
pub fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// Text of one part inside an xlsx package.
pub fn xlsx_part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).ok()?;
    Some(text)
}

pub fn shared_strings(bytes: &[u8]) -> String {
    xlsx_part(bytes, "xl/sharedStrings.xml").unwrap_or_default()
}

pub fn has_embedded_image(bytes: &[u8]) -> bool {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map(|archive| archive.file_names().any(|n| n.starts_with("xl/media/")))
        .unwrap_or(false)
}
