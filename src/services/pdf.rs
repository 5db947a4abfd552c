//! PDF stamping: draw QR codes onto the first page of a document.
//!
//! Codes are drawn as vector rectangles appended to the page content
//! stream, one filled square per dark module over a white backing. No
//! raster image is embedded, so the stamps stay crisp at any zoom.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::errors::{QrGenError, Result};

/// Stamp size in PDF points (1/72 inch). 80pt is about 28mm printed.
const STAMP_SIZE_PT: f32 = 80.0;
/// Distance from the bottom and right page edges.
const STAMP_MARGIN_PT: f32 = 20.0;
/// Horizontal gap between stamps.
const STAMP_GAP_PT: f32 = 10.0;
/// White backing extends this far past each code on every side.
const QUIET_ZONE_PT: f32 = 6.0;

/// Stamp each entry of `contents` as a QR code onto the first page of
/// `input`, writing the result to `output`. Codes are placed along the
/// bottom edge, right to left, first entry in the corner. All other
/// pages pass through untouched.
pub fn stamp_pdf(input: &Path, output: &Path, contents: &[&str]) -> Result<()> {
    if contents.is_empty() {
        return Err(QrGenError::pdf_processing("Nothing to stamp"));
    }

    let mut doc = Document::load(input)?;
    let pages = doc.get_pages();
    let (_, &page_id) = pages
        .iter()
        .next()
        .ok_or_else(|| QrGenError::pdf_processing("Document has no pages"))?;

    let (page_w, page_h) = page_size(&doc, page_id)?;
    let y = STAMP_MARGIN_PT;
    if y + STAMP_SIZE_PT > page_h {
        return Err(QrGenError::pdf_processing(format!(
            "Page too small for stamp ({}x{} pt)",
            page_w, page_h
        )));
    }

    let mut stream = doc.get_page_content(page_id)?;
    for (i, content) in contents.iter().enumerate() {
        let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::M)
            .map_err(|e| QrGenError::pdf_processing(format!("QR encoding failed: {}", e)))?;

        let x = page_w - STAMP_MARGIN_PT - (i as f32 + 1.0) * STAMP_SIZE_PT - i as f32 * STAMP_GAP_PT;
        if x < 0.0 {
            return Err(QrGenError::pdf_processing(format!(
                "Page too small for {} stamp(s) ({}x{} pt)",
                contents.len(),
                page_w,
                page_h
            )));
        }

        let overlay = overlay_ops(&code, x, y, STAMP_SIZE_PT).encode()?;
        stream.extend_from_slice(b"\n");
        stream.extend_from_slice(&overlay);
        debug!("Stamped QR onto first page at ({:.0}, {:.0})", x, y);
    }
    doc.change_page_content(page_id, stream)?;

    doc.save(output)?;
    Ok(())
}

/// Page dimensions from the MediaBox, walking up the page tree when the
/// entry is inherited.
fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32)> {
    let mut current = page_id;
    loop {
        let dict = doc.get_object(current)?.as_dict()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            let rect = doc.dereference(media_box)?.1.as_array()?;
            if rect.len() != 4 {
                return Err(QrGenError::pdf_processing("Malformed MediaBox"));
            }
            let mut vals = [0f32; 4];
            for (i, obj) in rect.iter().enumerate() {
                vals[i] = obj.as_float()?;
            }
            return Ok((vals[2] - vals[0], vals[3] - vals[1]));
        }
        match dict.get(b"Parent") {
            Ok(parent) => current = parent.as_reference()?,
            Err(_) => return Err(QrGenError::pdf_processing("Page has no MediaBox")),
        }
    }
}

/// Content-stream operations for the stamp: white backing rect, then one
/// black rect per dark module. Wrapped in q/Q to keep graphics state local.
fn overlay_ops(code: &QrCode, x: f32, y: f32, size: f32) -> Content {
    let width = code.width();
    let module = size / width as f32;
    let colors = code.to_colors();

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
        Operation::new(
            "re",
            vec![
                Object::Real(x - QUIET_ZONE_PT),
                Object::Real(y - QUIET_ZONE_PT),
                Object::Real(size + 2.0 * QUIET_ZONE_PT),
                Object::Real(size + 2.0 * QUIET_ZONE_PT),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
    ];

    for (idx, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let row = idx / width;
        let col = idx % width;
        // PDF origin is bottom-left; module rows count from the top.
        let mx = x + col as f32 * module;
        let my = y + size - (row as f32 + 1.0) * module;
        ops.push(Operation::new(
            "re",
            vec![
                Object::Real(mx),
                Object::Real(my),
                Object::Real(module),
                Object::Real(module),
            ],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    ops.push(Operation::new("Q", vec![]));
    Content { operations: ops }
}
