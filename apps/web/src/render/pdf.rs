//! Cover letter PDF composer.
//!
//! Layout: A4 portrait, 10 mm side/top margins, Helvetica 11 pt on a 5 mm
//! line grid. Blank source lines advance one grid line, other lines are
//! word-wrapped to the text width. Pages break automatically at the 20 mm
//! bottom margin. The optional signature sits 15 mm below the last line,
//! 40 mm wide.

use std::io::{Cursor, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{debug, warn};

use crate::render::font_metrics::HELVETICA;

const MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const SIGNATURE_GAP_MM: f32 = 15.0;
const SIGNATURE_WIDTH_MM: f32 = 40.0;

const FONT_RESOURCE: &str = "F1";
const SIGNATURE_RESOURCE: &str = "Im1";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("signature file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("signature image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF serialisation failed: {0}")]
    Pdf(String),
}

/// Composes the letter (and optional signature image bytes) into a PDF document.
pub fn compose_cover_letter(
    letter: &str,
    signature: Option<&[u8]>,
) -> Result<Vec<u8>, ComposeError> {
    let mut doc = Document::with_version("1.5");
    let mut layout = PageLayout::new();

    for line in letter.split('\n') {
        if line.trim().is_empty() {
            layout.advance(LINE_HEIGHT_MM);
            continue;
        }
        for wrapped in HELVETICA.wrap(line, FONT_SIZE_PT, layout.text_width_pt()) {
            layout.text_line(&wrapped);
        }
    }

    layout.advance(SIGNATURE_GAP_MM);

    let signature_id = match signature.filter(|bytes| !bytes.is_empty()) {
        Some(bytes) => {
            let image = load_signature(bytes)?;
            let height_mm = SIGNATURE_WIDTH_MM * image.height() as f32 / image.width() as f32;
            let id = doc.add_object(jpeg_xobject(&image)?);
            layout.image(SIGNATURE_WIDTH_MM, height_mm);
            Some(id)
        }
        None => None,
    };

    finish_document(&mut doc, layout.into_pages(), signature_id)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ComposeError::Pdf(e.to_string()))?;
    debug!("Composed cover letter PDF: {} bytes", bytes.len());
    Ok(bytes)
}

/// Cursor-based page builder; `y_mm` is measured from the top edge.
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    y_mm: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y_mm: MARGIN_MM,
        }
    }

    fn text_width_pt(&self) -> f32 {
        (PAGE_WIDTH_MM - 2.0 * MARGIN_MM) * MM
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // pages is never empty
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y_mm = MARGIN_MM;
    }

    /// Starts a new page if `height_mm` does not fit above the bottom margin.
    fn reserve(&mut self, height_mm: f32) {
        if self.y_mm + height_mm > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.new_page();
        }
    }

    fn advance(&mut self, height_mm: f32) {
        if self.y_mm + height_mm > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.new_page();
        } else {
            self.y_mm += height_mm;
        }
    }

    fn text_line(&mut self, text: &str) {
        self.reserve(LINE_HEIGHT_MM);
        // Baseline vertically centred in the line cell
        let baseline_mm = self.y_mm + 0.5 * LINE_HEIGHT_MM + 0.3 * FONT_SIZE_PT / MM;
        let x = MARGIN_MM * MM;
        let y = (PAGE_HEIGHT_MM - baseline_mm) * MM;

        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![FONT_RESOURCE.into(), FONT_SIZE_PT.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        ops.push(Operation::new("ET", vec![]));

        self.y_mm += LINE_HEIGHT_MM;
    }

    fn image(&mut self, width_mm: f32, height_mm: f32) {
        self.reserve(height_mm);
        let x = MARGIN_MM * MM;
        let y = (PAGE_HEIGHT_MM - self.y_mm - height_mm) * MM;

        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                (width_mm * MM).into(),
                0.0_f32.into(),
                0.0_f32.into(),
                (height_mm * MM).into(),
                x.into(),
                y.into(),
            ],
        ));
        ops.push(Operation::new("Do", vec![SIGNATURE_RESOURCE.into()]));
        ops.push(Operation::new("Q", vec![]));

        self.y_mm += height_mm;
    }

    fn into_pages(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

/// Writes the page tree, catalog, and info dictionary.
fn finish_document(
    doc: &mut Document,
    pages: Vec<Vec<Operation>>,
    signature_id: Option<ObjectId>,
) -> Result<(), ComposeError> {
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let mut resources = dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    };
    if let Some(id) = signature_id {
        resources.set("XObject", dictionary! { SIGNATURE_RESOURCE => id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| ComposeError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        (PAGE_WIDTH_MM * MM).into(),
        (PAGE_HEIGHT_MM * MM).into(),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Cover Letter"),
        "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    Ok(())
}

/// Decodes the signature through a temporary file, as uploaded images are
/// handled like any other on-disk image.
fn load_signature(bytes: &[u8]) -> Result<DynamicImage, ComposeError> {
    load_signature_in(bytes, &std::env::temp_dir())
}

/// The temporary file lives in `dir` and is removed before returning, whether
/// or not decoding succeeded.
fn load_signature_in(bytes: &[u8], dir: &Path) -> Result<DynamicImage, ComposeError> {
    let format = image::guess_format(bytes)?;
    let extension = format.extensions_str().first().copied().unwrap_or("img");

    let mut temp = tempfile::Builder::new()
        .prefix("signature-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;

    let decoded = image::open(temp.path());

    if let Err(e) = temp.close() {
        warn!("Failed to remove temporary signature file: {e}");
    }
    Ok(decoded?)
}

/// JPEG image XObject with transparency flattened onto white.
fn jpeg_xobject(image: &DynamicImage) -> Result<Stream, ComposeError> {
    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let (width, height) = rgb.dimensions();
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ))
}

/// Encodes text for a WinAnsiEncoding base-14 font.
/// Typographic punctuation maps to its WinAnsi code; anything else unknown becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            '\t' => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}
