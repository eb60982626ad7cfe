//! Drawing scopes handed to applets during the panel render pass.
//!
//! The toolkit adapter (`panel-wayland`) implements [`Surface`] on top of an
//! iced canvas frame; [`RecordingSurface`] is a headless implementation that
//! records every operation in absolute panel coordinates.

use crate::geometry::{Allocation, Color, Position, Rect};
use std::path::PathBuf;
use std::sync::Arc;

/// Raw RGBA pixels (straight alpha, row-major, no padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    pub width:  u32,
    pub height: u32,
    pub rgba:   Arc<[u8]>,
}

/// Something an applet can paint as an icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// An image file (PNG, SVG, XPM …) resolved from an icon theme.
    File(PathBuf),
    /// In-memory pixels, e.g. copied out of a native pixbuf.
    Pixels(Pixmap),
}

/// A translated, clipped rendering context.
///
/// Coordinates passed to every method are relative to the scope's origin.
/// Implementations must discard anything outside the scope's clip.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn draw_icon(&mut self, icon: &Icon, rect: Rect);

    /// Draw `text` with its top-left corner at `origin`.
    fn draw_text(&mut self, text: &str, origin: Position, size: f32, color: Color);

    /// Run `draw` inside a nested scope translated to `origin` and clipped to
    /// `clip`.  Transforms applied inside never leak out of the closure.
    fn with_scope(
        &mut self,
        origin: Position,
        clip: Allocation,
        draw: &mut dyn FnMut(&mut dyn Surface),
    );
}

/// Measures the horizontal advance of a label at a given font size.
pub trait TextMeasure: std::fmt::Debug {
    fn advance(&self, text: &str, size: f32) -> u32;
}

/// Character-count estimate for contexts built without a toolkit, such as
/// [`AppletContext::default`](crate::AppletContext).  It ignores glyph
/// shapes, so panels that draw text pass a shaping measurement instead.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMetrics {
    /// Average glyph advance as a fraction of the font size.
    pub advance_ratio: f32,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self { advance_ratio: 0.55 }
    }
}

impl TextMeasure for EstimatedMetrics {
    fn advance(&self, text: &str, size: f32) -> u32 {
        (text.chars().count() as f32 * size * self.advance_ratio).ceil() as u32
    }
}

// ── Headless implementation ───────────────────────────────────────────────────

/// One recorded drawing operation, in absolute panel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Scope { origin: Position, clip: Rect },
    Fill { rect: Rect, color: Color },
    Icon { icon: Icon, rect: Rect },
    Text { text: String, origin: Position, size: f32 },
}

/// A [`Surface`] that records operations instead of painting them.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
    offset: Position,
    clip: Option<Rect>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles of every recorded icon, in paint order.
    pub fn icon_rects(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Icon { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Clip rectangles of every scope opened, in order.
    pub fn scopes(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Scope { clip, .. } => Some(*clip),
                _ => None,
            })
            .collect()
    }

    fn absolute(&self, rect: Rect) -> Rect {
        Rect::new(rect.x + self.offset.x, rect.y + self.offset.y, rect.width, rect.height)
    }

    fn visible(&self, rect: &Rect) -> bool {
        self.clip.map_or(true, |clip| clip.intersects(rect))
    }
}

impl Surface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.absolute(rect);
        if self.visible(&rect) {
            self.ops.push(DrawOp::Fill { rect, color });
        }
    }

    fn draw_icon(&mut self, icon: &Icon, rect: Rect) {
        let rect = self.absolute(rect);
        if self.visible(&rect) {
            self.ops.push(DrawOp::Icon { icon: icon.clone(), rect });
        }
    }

    fn draw_text(&mut self, text: &str, origin: Position, size: f32, _color: Color) {
        let origin = Position::new(origin.x + self.offset.x, origin.y + self.offset.y);
        self.ops.push(DrawOp::Text { text: text.to_string(), origin, size });
    }

    fn with_scope(
        &mut self,
        origin: Position,
        clip: Allocation,
        draw: &mut dyn FnMut(&mut dyn Surface),
    ) {
        let saved = (self.offset, self.clip);

        self.offset = Position::new(self.offset.x + origin.x, self.offset.y + origin.y);
        let scope = Rect::from_parts(self.offset, clip);
        self.clip = Some(match self.clip {
            Some(outer) if outer.intersects(&scope) => {
                let x = outer.x.max(scope.x);
                let y = outer.y.max(scope.y);
                let right = outer.right().min(scope.right());
                let bottom = outer.bottom().min(scope.bottom());
                Rect::new(x, y, (right - x) as u32, (bottom - y) as u32)
            }
            Some(_) => Rect::new(scope.x, scope.y, 0, 0),
            None => scope,
        });
        self.ops.push(DrawOp::Scope { origin: self.offset, clip: scope });

        draw(self);

        (self.offset, self.clip) = saved;
    }
}
