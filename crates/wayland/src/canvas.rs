//! The panel strip as one iced canvas.
//!
//! Chrome and every applet draw into their own [`Cache`], so a render
//! request from one applet only re-records that applet's geometry.

use crate::{surface::FrameSurface, Message};
use iced::widget::canvas::{self, Cache, Geometry};
use iced::{mouse, Font, Rectangle, Renderer};
use panel_renderer::{compositor, Damage, Panel};
use panel_theme::PanelStyle;

/// Recorded geometry, kept across frames.
#[derive(Default)]
pub struct StripCaches {
    chrome:  Cache,
    /// One per applet, in layout order.
    applets: Vec<Cache>,
}

impl StripCaches {
    /// Forget the chrome (background, border, shadow).
    pub fn clear_chrome(&mut self) {
        self.chrome.clear();
    }

    /// Forget the geometry of every applet touched by `damage`.  A change in
    /// the number of applets starts over.
    pub fn apply(&mut self, panel: &Panel, damage: &Damage) {
        let count = panel.model().applets().count();
        if self.applets.len() != count {
            self.applets = (0..count).map(|_| Cache::new()).collect();
            self.chrome.clear();
            return;
        }

        for (hit, cache) in compositor::damaged(panel.model(), damage).zip(&self.applets) {
            if hit {
                cache.clear();
            }
        }
        if damage.bounds() == Some(panel.bounds()) {
            self.chrome.clear();
        }
    }
}

pub struct Strip<'a> {
    pub panel:  &'a Panel,
    pub caches: &'a StripCaches,
    pub style:  PanelStyle,
    pub font:   Font,
}

impl canvas::Program<Message> for Strip<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let size = bounds.size();
        let (width, height) = (self.panel.width(), self.panel.height());

        let mut layers = vec![self.caches.chrome.draw(renderer, size, |frame| {
            compositor::paint_chrome(&mut FrameSurface::new(frame, self.font), &self.style, width, height);
        })];

        layers.extend(self.panel.model().applets().zip(&self.caches.applets).map(|(applet, cache)| {
            cache.draw(renderer, size, |frame| {
                compositor::paint_applet(applet, &mut FrameSurface::new(frame, self.font));
            })
        }));

        layers
    }
}
