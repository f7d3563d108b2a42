//! Advance widths of the standard Helvetica faces, used for text alignment.
//!
//! Values are the AFM widths (thousandths of an em) for printable ASCII,
//! starting at the space character.

use super::canvas::FontStyle;

const MM_PER_POINT: f32 = 25.4 / 72.0;
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(ch: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Normal => &HELVETICA,
        FontStyle::Bold => &HELVETICA_BOLD,
    };
    (ch as usize)
        .checked_sub(32)
        .and_then(|index| table.get(index))
        .copied()
        .unwrap_or(FALLBACK_WIDTH)
}

/// Width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, size: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(ch, style))).sum();
    units as f32 / 1000.0 * size * MM_PER_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(char_width(' ', FontStyle::Normal), 278);
        assert_eq!(char_width('A', FontStyle::Normal), 667);
        assert_eq!(char_width('A', FontStyle::Bold), 722);
        assert_eq!(char_width('~', FontStyle::Bold), 584);
        assert_eq!(char_width('é', FontStyle::Normal), FALLBACK_WIDTH);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let small = text_width("SERTIFIKAT", 10.0, FontStyle::Bold);
        let large = text_width("SERTIFIKAT", 20.0, FontStyle::Bold);
        assert!((large - 2.0 * small).abs() < 1e-4);
        // 72 pt of a 1000-unit glyph run is exactly one inch.
        assert!((text_width("MMMMMM", 72.0, FontStyle::Normal) - 6.0 * 0.833 * 25.4).abs() < 1e-2);
    }
}
