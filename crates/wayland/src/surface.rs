//! [`Surface`] on top of an iced canvas frame.

use iced::widget::canvas::{self, Frame};
use iced::widget::{image, svg};
use iced::{Font, Pixels, Point, Rectangle, Size};
use panel_core::{Allocation, Color, Icon, Position, Rect, Surface};
use panel_theme::ToIced;

pub struct FrameSurface<'a> {
    frame: &'a mut Frame,
    font:  Font,
}

impl<'a> FrameSurface<'a> {
    pub fn new(frame: &'a mut Frame, font: Font) -> Self {
        Self { frame, font }
    }
}

fn bounds(rect: Rect) -> Rectangle {
    Rectangle::new(
        Point::new(rect.x as f32, rect.y as f32),
        Size::new(rect.width as f32, rect.height as f32),
    )
}

impl Surface for FrameSurface<'_> {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let area = bounds(rect);
        self.frame.fill_rectangle(area.position(), area.size(), color.to_iced());
    }

    fn draw_icon(&mut self, icon: &Icon, rect: Rect) {
        let area = bounds(rect);
        match icon {
            Icon::File(path) if path.extension().is_some_and(|ext| ext == "svg") => {
                self.frame.draw_svg(area, &svg::Handle::from_path(path));
            }
            Icon::File(path) => {
                self.frame.draw_image(area, &image::Handle::from_path(path));
            }
            Icon::Pixels(pixmap) => {
                let handle = image::Handle::from_rgba(pixmap.width, pixmap.height, pixmap.rgba.to_vec());
                self.frame.draw_image(area, &handle);
            }
        }
    }

    fn draw_text(&mut self, text: &str, origin: Position, size: f32, color: Color) {
        self.frame.fill_text(canvas::Text {
            content: text.to_string(),
            position: Point::new(origin.x as f32, origin.y as f32),
            color: color.to_iced(),
            size: Pixels(size),
            font: self.font,
            ..canvas::Text::default()
        });
    }

    fn with_scope(
        &mut self,
        origin: Position,
        clip: Allocation,
        draw: &mut dyn FnMut(&mut dyn Surface),
    ) {
        let region = bounds(Rect::from_parts(origin, clip));
        let font = self.font;
        self.frame.with_clip(region, |frame| {
            draw(&mut FrameSurface { frame, font });
        });
    }
}
