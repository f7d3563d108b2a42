//! Recorded drawing surface.
//!
//! Layouts draw onto a [`Canvas`] with top-left origin millimetre
//! coordinates on A4 portrait, the same way a letter is measured on paper.
//! The canvas keeps the operations per page so they can be inspected and
//! then serialized by the PDF backend in one go.

use super::backend;
use super::metrics::text_width;
use crate::document::CompositionError;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        /// Left edge of the text after alignment.
        x: f32,
        /// Baseline, measured from the top of the page.
        y: f32,
        size: f32,
        style: FontStyle,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        width: f32,
    },
}

pub struct Canvas {
    title: String,
    pages: Vec<Vec<DrawOp>>,
    font_size: f32,
    font_style: FontStyle,
    line_width: f32,
}

impl Canvas {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Vec::new()],
            font_size: 12.0,
            font_style: FontStyle::Normal,
            line_width: 0.2,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_width(&self) -> f32 {
        A4_WIDTH_MM
    }

    pub fn page_height(&self) -> f32 {
        A4_HEIGHT_MM
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size;
    }

    pub fn set_font_style(&mut self, style: FontStyle) {
        self.font_style = style;
    }

    /// Stroke width in millimetres for subsequent lines and rectangles.
    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    /// Left-aligned text with its baseline at `y`.
    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32) {
        self.text_aligned(text, x, y, Align::Left);
    }

    /// Text anchored at `x`: its left edge, centre or right edge depending on `align`.
    pub fn text_aligned(&mut self, text: impl Into<String>, x: f32, y: f32, align: Align) {
        let text = text.into();
        let width = text_width(&text, self.font_size, self.font_style);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let op = DrawOp::Text {
            text,
            x: left,
            y,
            size: self.font_size,
            style: self.font_style,
        };
        self.current_page().push(op);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let op = DrawOp::Line {
            from: (x1, y1),
            to: (x2, y2),
            width: self.line_width,
        };
        self.current_page().push(op);
    }

    /// Stroked (unfilled) rectangle with its top-left corner at `(x, y)`.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let op = DrawOp::Rect {
            x,
            y,
            w,
            h,
            width: self.line_width,
        };
        self.current_page().push(op);
    }

    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Texts drawn on page `index` (zero based) with their baselines.
    pub fn texts_on(&self, index: usize) -> Vec<(&str, f32)> {
        self.pages
            .get(index)
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, y, .. } => Some((text.as_str(), *y)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Serialize every page into a PDF file.
    pub fn to_pdf(&self) -> Result<Vec<u8>, CompositionError> {
        backend::render(self)
    }

    fn current_page(&mut self) -> &mut Vec<DrawOp> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}
