//! Order PDF renderer.
//!
//! One page per physical copy: the total page count is the sum of item
//! quantities. Each page carries the centered artwork, a rotated order header
//! on the left, rotated product info on the right and a QR code of the order
//! id in the bottom-left corner. Text uses the standard Helvetica font, so no
//! font files are read.

use std::io::Write;
use std::path::PathBuf;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{Luma, Rgba, RgbaImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect as PdfRect, Ref, Str};
use printshop_core::imaging::{self, ImageError};
use qrcode::QrCode;
use uuid::Uuid;

use crate::geometry::{MugDimensions, PageLayout, Rect};

pub const DEFAULT_QR_PIXELS: u32 = 100;

/// Header label when the order has no number yet.
pub const UNKNOWN_ORDER_LABEL: &str = "UNKNOWN";

const FONT_SIZE: f64 = 10.0;
const PRODUCT_INFO_SEPARATOR: &str = " | ";

const FONT: Name<'static> = Name(b"F1");
const ARTWORK: Name<'static> = Name(b"Art");
const QR: Name<'static> = Name(b"Qr");

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("Order has no printable copies")]
    NoPages,

    #[error("Failed to render QR code: {0}")]
    Qr(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Failed to compress image data: {0}")]
    Compress(#[from] std::io::Error),
}

/// One order line as the renderer sees it.
#[derive(Debug, Clone, Default)]
pub struct PrintItem {
    pub quantity: u32,
    /// Already-loaded artwork, preferred over `image_path`.
    pub inline_image: Option<Vec<u8>>,
    /// Artwork on disk, used when no inline bytes are usable.
    pub image_path: Option<PathBuf>,
    pub dimensions: MugDimensions,
    pub supplier_article_name: Option<String>,
    pub supplier_article_number: Option<String>,
    pub variant_name: Option<String>,
}

impl PrintItem {
    /// Pipe-joined supplier name, supplier number and variant, skipping blanks.
    pub fn product_info(&self) -> String {
        [
            &self.supplier_article_name,
            &self.supplier_article_number,
            &self.variant_name,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(PRODUCT_INFO_SEPARATOR)
    }
}

#[derive(Debug, Clone)]
pub struct PrintJob {
    pub order_id: Uuid,
    pub order_number: Option<String>,
    pub items: Vec<PrintItem>,
    pub qr_pixels: u32,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the print PDF of an order.
pub fn render_order_pdf(job: &PrintJob) -> Result<Vec<u8>, PdfError> {
    let total: u32 = job.items.iter().map(|i| i.quantity).sum();
    if total == 0 {
        return Err(PdfError::NoPages);
    }

    let mut pdf = Pdf::new();
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let tree_id = alloc.bump();
    let font_id = alloc.bump();

    pdf.catalog(catalog_id).pages(tree_id);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let qr = EmbeddedImage::from_rgba(&qr_image(&job.order_id.to_string(), job.qr_pixels)?)?;
    let qr_id = qr.write(&mut pdf, &mut alloc);

    let label = job
        .order_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_ORDER_LABEL);

    let mut page_ids = Vec::with_capacity(total as usize);
    for item in job.items.iter().filter(|i| i.quantity > 0) {
        let layout = PageLayout::for_dimensions(&item.dimensions);
        let artwork = EmbeddedImage::from_rgba(&load_artwork(item)?)?;
        let artwork_id = artwork.write(&mut pdf, &mut alloc);
        let info = item.product_info();

        for _ in 0..item.quantity {
            let page_number = page_ids.len() + 1;
            let page_id = alloc.bump();
            let content_id = alloc.bump();

            let header = format!("{label} ({page_number}/{total})");
            pdf.stream(content_id, &page_content(&layout, &header, &info));

            let mut page = pdf.page(page_id);
            page.media_box(PdfRect::new(0.0, 0.0, layout.width as f32, layout.height as f32))
                .parent(tree_id)
                .contents(content_id);
            let mut resources = page.resources();
            resources
                .x_objects()
                .pair(ARTWORK, artwork_id)
                .pair(QR, qr_id);
            resources.fonts().pair(FONT, font_id);
            resources.finish();
            page.finish();

            page_ids.push(page_id);
        }
    }

    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    Ok(pdf.finish())
}

fn page_content(layout: &PageLayout, header: &str, info: &str) -> Vec<u8> {
    let mut content = Content::new();

    draw_image(&mut content, ARTWORK, layout.artwork);
    draw_image(&mut content, QR, layout.qr_rect());

    rotated_text(
        &mut content,
        layout.margin + FONT_SIZE,
        (layout.height - text_width(header)) / 2.0,
        header,
    );
    if !info.is_empty() {
        rotated_text(
            &mut content,
            layout.width - layout.margin,
            (layout.height - text_width(info)) / 2.0,
            info,
        );
    }

    content.finish()
}

fn draw_image(content: &mut Content, name: Name<'_>, at: Rect) {
    content.save_state();
    content.transform([
        at.width as f32,
        0.0,
        0.0,
        at.height as f32,
        at.x as f32,
        at.y as f32,
    ]);
    content.x_object(name);
    content.restore_state();
}

/// Draw `text` rotated 90 degrees counter-clockwise with its baseline at `x`.
fn rotated_text(content: &mut Content, x: f64, y: f64, text: &str) {
    content.begin_text();
    content.set_font(FONT, FONT_SIZE as f32);
    content.set_text_matrix([0.0, 1.0, -1.0, 0.0, x as f32, y as f32]);
    content.show(Str(&win_ansi(text)));
    content.end_text();
}

/// Lossy WinAnsi encoding: Latin-1 code points pass through, the rest become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Advance width of `text` in points at the header font size.
pub fn text_width(text: &str) -> f64 {
    let units: u32 = text.chars().map(helvetica_width).sum();
    f64::from(units) * FONT_SIZE / 1000.0
}

/// Helvetica glyph widths (1/1000 em) for printable ASCII.
fn helvetica_width(c: char) -> u32 {
    const WIDTHS: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
        334, 260, 334, 584, // '{'..'~'
    ];
    match c {
        ' '..='~' => u32::from(WIDTHS[c as usize - 0x20]),
        _ => 556,
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Pick the artwork of an item: inline bytes, then the file on disk, then
/// the built-in placeholder.
pub fn load_artwork(item: &PrintItem) -> Result<RgbaImage, PdfError> {
    if let Some(bytes) = &item.inline_image {
        match imaging::decode_rgba8(bytes) {
            Ok(img) => return Ok(img),
            Err(e) => tracing::warn!(error = %e, "Inline artwork unusable; trying disk"),
        }
    }
    if let Some(path) = &item.image_path {
        match std::fs::read(path) {
            Ok(bytes) => match imaging::decode_rgba8(&bytes) {
                Ok(img) => return Ok(img),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Stored artwork unusable"),
            },
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Stored artwork missing"),
        }
    }
    Ok(imaging::decode_rgba8(&placeholder_png()?)?)
}

/// The neutral grey PNG printed when an item has no usable artwork.
pub fn placeholder_png() -> Result<Vec<u8>, PdfError> {
    const WIDTH: u32 = 478;
    const HEIGHT: u32 = 164;
    const BORDER: u32 = 4;
    let img = RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let edge = x < BORDER || y < BORDER || x >= WIDTH - BORDER || y >= HEIGHT - BORDER;
        if edge {
            Rgba([160, 160, 160, 255])
        } else {
            Rgba([225, 225, 225, 255])
        }
    });
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

fn qr_image(payload: &str, pixels: u32) -> Result<RgbaImage, PdfError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| PdfError::Qr(e.to_string()))?;
    let pixels = if pixels == 0 { DEFAULT_QR_PIXELS } else { pixels };
    let luma = code
        .render::<Luma<u8>>()
        .min_dimensions(pixels, pixels)
        .build();
    Ok(image::DynamicImage::ImageLuma8(luma).to_rgba8())
}

/// An 8-bit RGB image with optional soft mask, both zlib-compressed.
struct EmbeddedImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl EmbeddedImage {
    fn from_rgba(img: &RgbaImage) -> Result<Self, PdfError> {
        let pixels = img.pixels().len();
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for Rgba([r, g, b, a]) in img.pixels().copied() {
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);

        Ok(Self {
            width: img.width(),
            height: img.height(),
            rgb: deflate(&rgb)?,
            alpha: if opaque { None } else { Some(deflate(&alpha)?) },
        })
    }

    fn write(&self, pdf: &mut Pdf, alloc: &mut Ref) -> Ref {
        let id = alloc.bump();
        let mask_id = self.alpha.as_ref().map(|_| alloc.bump());

        let mut xobject = pdf.image_xobject(id, &self.rgb);
        xobject.filter(Filter::FlateDecode);
        xobject.width(self.width as i32);
        xobject.height(self.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            xobject.s_mask(mask_id);
        }
        xobject.finish();

        if let (Some(mask_id), Some(alpha)) = (mask_id, &self.alpha) {
            let mut mask = pdf.image_xobject(mask_id, alpha);
            mask.filter(Filter::FlateDecode);
            mask.width(self.width as i32);
            mask.height(self.height as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            mask.finish();
        }

        id
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
