//! Label measurement on the shaping engine the canvas draws with.

use iced::advanced::graphics::text::Paragraph;
use iced::advanced::text::{Alignment, LineHeight, Paragraph as _, Shaping, Text, Wrapping};
use iced::{alignment, Font, Pixels, Size};
use panel_core::TextMeasure;

/// Advance widths as `Frame::fill_text` will lay the label out: same font,
/// same size, same shaping, one line.
#[derive(Debug, Clone, Copy)]
pub struct ShapedMetrics {
    font: Font,
}

impl ShapedMetrics {
    pub fn new(font: Font) -> Self {
        Self { font }
    }
}

impl TextMeasure for ShapedMetrics {
    fn advance(&self, label: &str, size: f32) -> u32 {
        if label.is_empty() {
            return 0;
        }

        let paragraph = Paragraph::with_text(Text {
            content: label,
            bounds: Size::INFINITE,
            size: Pixels(size),
            // canvas::Text default
            line_height: LineHeight::Relative(1.2),
            font: self.font,
            align_x: Alignment::Default,
            align_y: alignment::Vertical::Top,
            shaping: Shaping::default(),
            wrapping: Wrapping::None,
        });

        paragraph.min_bounds().width.ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_shapes_decide_the_width() {
        let metrics = ShapedMetrics::new(Font::DEFAULT);
        let narrow = metrics.advance("iiiiiiii", 14.0);
        let wide = metrics.advance("WWWWWWWW", 14.0);

        assert!(narrow > 0);
        assert!(wide > narrow, "narrow={narrow} wide={wide}");
    }

    #[test]
    fn empty_label_takes_no_space() {
        assert_eq!(ShapedMetrics::new(Font::DEFAULT).advance("", 14.0), 0);
    }

    #[test]
    fn grows_with_font_size() {
        let metrics = ShapedMetrics::new(Font::DEFAULT);
        assert!(metrics.advance("Network", 20.0) > metrics.advance("Network", 10.0));
    }
}
