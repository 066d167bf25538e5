//! Page geometry for mug print sheets, in PDF points.
//!
//! Millimetre inputs come from the article's mug details; anything missing
//! falls back to the standard 239 x 99 mm sheet with a 1 mm margin.

/// Points per millimetre.
pub const MM_TO_PT: f64 = 2.834_645_7;

pub const DEFAULT_PAGE_WIDTH_MM: f64 = 239.0;
pub const DEFAULT_PAGE_HEIGHT_MM: f64 = 99.0;
pub const DEFAULT_MARGIN_MM: f64 = 1.0;

/// Vertical room reserved around the artwork when no template size is known.
pub const ARTWORK_HEADROOM_MM: f64 = 15.0;

/// Edge length of the QR code.
pub const QR_SIZE_PT: f64 = 40.0;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// Optional mug dimensions, in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MugDimensions {
    pub print_template_width_mm: Option<f64>,
    pub print_template_height_mm: Option<f64>,
    pub document_format_width_mm: Option<f64>,
    pub document_format_height_mm: Option<f64>,
    pub document_format_margin_bottom_mm: Option<f64>,
}

/// An axis-aligned rectangle in points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Resolved layout of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub artwork: Rect,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl PageLayout {
    pub fn for_dimensions(dims: &MugDimensions) -> Self {
        let page_w = positive(dims.document_format_width_mm).unwrap_or(DEFAULT_PAGE_WIDTH_MM);
        let page_h = positive(dims.document_format_height_mm).unwrap_or(DEFAULT_PAGE_HEIGHT_MM);
        let margin = dims
            .document_format_margin_bottom_mm
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(DEFAULT_MARGIN_MM);

        let (art_w, art_h) = match (
            positive(dims.print_template_width_mm),
            positive(dims.print_template_height_mm),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => (
                page_w - 2.0 * margin,
                page_h - 2.0 * margin - ARTWORK_HEADROOM_MM,
            ),
        };

        let width = mm_to_pt(page_w);
        let height = mm_to_pt(page_h);
        let art_w = mm_to_pt(art_w.max(0.0));
        let art_h = mm_to_pt(art_h.max(0.0));

        Self {
            width,
            height,
            margin: mm_to_pt(margin),
            artwork: Rect {
                x: (width - art_w) / 2.0,
                y: (height - art_h) / 2.0,
                width: art_w,
                height: art_h,
            },
        }
    }

    /// Where the QR code sits: bottom-left, inside the margin.
    pub fn qr_rect(&self) -> Rect {
        Rect {
            x: self.margin,
            y: self.margin,
            width: QR_SIZE_PT,
            height: QR_SIZE_PT,
        }
    }
}
