//! printpdf serialization of a recorded [`Canvas`].

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use super::canvas::{Canvas, DrawOp, FontStyle};
use crate::document::CompositionError;

const LAYER_NAME: &str = "Layer 1";
const POINTS_PER_MM: f32 = 72.0 / 25.4;

struct Fonts {
    normal: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.normal,
            FontStyle::Bold => &self.bold,
        }
    }
}

pub fn render(canvas: &Canvas) -> Result<Vec<u8>, CompositionError> {
    let width = Mm(canvas.page_width());
    let height = canvas.page_height();

    let (doc, first_page, first_layer) =
        PdfDocument::new(canvas.title(), width, Mm(height), LAYER_NAME);

    let fonts = Fonts {
        normal: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| CompositionError::Font(format!("{:?}", e)))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| CompositionError::Font(format!("{:?}", e)))?,
    };

    for (index, ops) in canvas.pages().iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(width, Mm(height), LAYER_NAME);
            doc.get_page(page).get_layer(layer)
        };
        draw_page(&layer, ops, &fonts, height);
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer)
            .map_err(|e| CompositionError::Save(format!("{:?}", e)))?;
    }
    log::debug!(
        "Serialized {} page(s) of '{}' into {} bytes",
        canvas.page_count(),
        canvas.title(),
        buf.len()
    );
    Ok(buf)
}

fn point(x: f32, y: f32, page_height: f32) -> (Point, bool) {
    (Point::new(Mm(x), Mm(page_height - y)), false)
}

fn draw_page(layer: &PdfLayerReference, ops: &[DrawOp], fonts: &Fonts, page_height: f32) {
    for op in ops {
        match op {
            DrawOp::Text {
                text,
                x,
                y,
                size,
                style,
            } => {
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(page_height - *y), fonts.get(*style));
            }
            DrawOp::Line { from, to, width } => {
                layer.set_outline_thickness(*width * POINTS_PER_MM);
                layer.add_line(Line {
                    points: vec![
                        point(from.0, from.1, page_height),
                        point(to.0, to.1, page_height),
                    ],
                    is_closed: false,
                });
            }
            DrawOp::Rect { x, y, w, h, width } => {
                layer.set_outline_thickness(*width * POINTS_PER_MM);
                layer.add_line(Line {
                    points: vec![
                        point(*x, *y, page_height),
                        point(*x + *w, *y, page_height),
                        point(*x + *w, *y + *h, page_height),
                        point(*x, *y + *h, page_height),
                    ],
                    is_closed: true,
                });
            }
        }
    }
}
