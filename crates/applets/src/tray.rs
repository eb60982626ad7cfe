//! StatusNotifierItem tray.

use crate::strip::{IconStrip, DEFAULT_HEIGHT};
use panel_core::{
    state::TrayItem, Allocation, Applet, AppletAction, AppletContext, AppletMessage, AppletState,
    Icon, PanelError, Result, Surface,
};
use panel_system::{IconCache, IconLookup};
use std::path::PathBuf;
use tracing::{debug, warn};

pub const ID: &str = "org.cream.simplepanel.ApplicationIndicatorApplet";

/// One icon per registered item, in registration order.
///
/// Items whose icon can't be resolved take no slot at all.
#[derive(Debug)]
pub struct TrayApplet {
    state: AppletState,
    items: Vec<TrayItem>,
    icons: Box<dyn IconLookup>,
    /// `(index into items, icon file)` for every item that gets a slot.
    shown: Vec<(usize, PathBuf)>,
    height: u32,
}

impl TrayApplet {
    /// Fails with `ExternalBridge` when no D-Bus session bus is reachable.
    pub fn new(ctx: &AppletContext) -> Result<Self> {
        panel_system::tray::session_bus_available().map_err(|e| PanelError::bridge(ID, e))?;
        Ok(Self::with_icons(ctx, Box::new(IconCache::default())))
    }

    pub fn with_icons(ctx: &AppletContext, icons: Box<dyn IconLookup>) -> Self {
        Self {
            state: AppletState::new(),
            items: Vec::new(),
            icons,
            shown: Vec::new(),
            height: ctx.height,
        }
    }

    pub fn items(&self) -> &[TrayItem] {
        &self.items
    }

    fn strip(&self) -> IconStrip {
        IconStrip::for_allocation(self.get_allocation())
    }

    fn set_items(&mut self, items: Vec<TrayItem>) {
        if items == self.items {
            return;
        }
        debug!("Tray now has {} item(s)", items.len());
        self.items = items;

        let height = self.get_allocation().map_or(self.height, |a| a.height);
        if let Err(e) = self.allocate(height) {
            warn!("Tray failed to re-allocate: {e}");
        }
        self.draw();
    }
}

impl Applet for TrayApplet {
    fn id(&self) -> &str {
        ID
    }

    fn state(&self) -> &AppletState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AppletState {
        &mut self.state
    }

    fn allocate(&mut self, height: u32) -> Result<Allocation> {
        let strip = IconStrip::new(height);
        self.icons.set_size(strip.size as u16);

        self.shown.clear();
        for (index, item) in self.items.iter().enumerate() {
            match self.icons.lookup(item.current_icon_name(), &item.icon_theme_path) {
                Ok(path) => self.shown.push((index, path)),
                Err(e) => debug!("Hiding tray item {}: {e}", item.service),
            }
        }

        let width = strip.width(self.shown.len());
        self.set_allocation(width, height);
        Ok(Allocation::new(width, height))
    }

    fn render(&self, surface: &mut dyn Surface) {
        let strip = self.strip();
        for (k, (_, path)) in self.shown.iter().enumerate() {
            surface.draw_icon(&Icon::File(path.clone()), strip.slot(k));
        }
    }

    fn handle_click(&mut self, x: i32, y: i32) {
        let Some(k) = self.strip().slot_at(self.shown.len(), x, y) else {
            return;
        };
        let item = &self.items[self.shown[k].0];

        // The item's own menu opens at absolute coordinates, just below the panel.
        let origin = self.get_position().unwrap_or_default();
        let height = self.get_allocation().map_or(DEFAULT_HEIGHT, |a| a.height);
        let action = AppletAction::ActivateTrayItem {
            service: item.service.clone(),
            x: origin.x + x,
            y: origin.y + height as i32 + 1,
        };
        self.state.request(action);
    }

    fn on_message(&mut self, message: &AppletMessage) {
        if let AppletMessage::TrayItems(items) = message {
            self.set_items(items.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{icon_path, FakeIcons};
    use panel_core::{state::ItemStatus, surface::RecordingSurface, AppletEvent, Rect};

    fn item(service: &str, icon: &str) -> TrayItem {
        TrayItem {
            service: service.into(),
            icon_name: icon.into(),
            ..Default::default()
        }
    }

    fn tray(missing: &[&str], items: Vec<TrayItem>) -> TrayApplet {
        let mut tray = TrayApplet::with_icons(&AppletContext::default(), FakeIcons::without(missing));
        tray.on_message(&AppletMessage::TrayItems(items));
        tray.set_position(1300, 0);
        tray.state.drain_events();
        tray
    }

    #[test]
    fn width_follows_item_count() {
        let tray = tray(&[], vec![item(":1.1/a", "nm-applet"), item(":1.2/b", "blueman")]);
        assert_eq!(tray.get_allocation(), Some(Allocation::new(5 + 2 * 27, 24)));
    }

    #[test]
    fn empty_tray_is_just_padding() {
        let mut tray = TrayApplet::with_icons(&AppletContext::default(), FakeIcons::without(&[]));
        assert_eq!(tray.allocate(24).unwrap(), Allocation::new(5, 24));
    }

    #[test]
    fn unresolvable_icons_take_no_slot() {
        let tray = tray(&["broken"], vec![item(":1.1/a", "broken"), item(":1.2/b", "blueman")]);
        assert_eq!(tray.get_allocation().unwrap().width, 5 + 27);

        let mut surface = RecordingSurface::new();
        tray.render(&mut surface);
        assert_eq!(
            surface.ops,
            vec![panel_core::surface::DrawOp::Icon {
                icon: Icon::File(icon_path("blueman")),
                rect: Rect::new(5, 1, 22, 22),
            }]
        );
    }

    #[test]
    fn hit_rectangles_match_painted_rectangles() {
        let mut tray = tray(&[], vec![item(":1.1/a", "a"), item(":1.2/b", "b"), item(":1.3/c", "c")]);

        let mut surface = RecordingSurface::new();
        tray.render(&mut surface);
        let painted = surface.icon_rects();
        assert_eq!(painted.len(), 3);

        for (k, rect) in painted.iter().enumerate() {
            for (x, y) in [(rect.x, rect.y), (rect.right(), rect.bottom())] {
                tray.handle_click(x, y);
                let events = tray.state.drain_events();
                assert!(
                    matches!(&events[..], [AppletEvent::Action(AppletAction::ActivateTrayItem { service, .. })]
                        if *service == tray.items()[k].service),
                    "click at ({x}, {y}) should hit item {k}, got {events:?}"
                );
            }
        }
    }

    #[test]
    fn click_reports_absolute_coordinates() {
        let mut tray = tray(&[], vec![item(":1.1/a", "a")]);
        tray.handle_click(10, 10);
        assert_eq!(
            tray.state.drain_events(),
            vec![AppletEvent::Action(AppletAction::ActivateTrayItem {
                service: ":1.1/a".into(),
                x: 1310,
                y: 25,
            })]
        );

        tray.handle_click(2, 10);
        assert!(tray.state.drain_events().is_empty(), "padding is not a slot");
    }

    #[test]
    fn attention_status_switches_icon() {
        let mut urgent = item(":1.1/a", "mail-read");
        urgent.attention_icon_name = "mail-unread".into();
        urgent.status = ItemStatus::NeedsAttention;
        let tray = tray(&[], vec![urgent]);

        let mut surface = RecordingSurface::new();
        tray.render(&mut surface);
        assert!(matches!(&surface.ops[0], panel_core::surface::DrawOp::Icon { icon: Icon::File(p), .. } if *p == icon_path("mail-unread")));
    }

    #[test]
    fn item_changes_reallocate_and_redraw() {
        let mut tray = tray(&[], vec![item(":1.1/a", "a")]);
        tray.on_message(&AppletMessage::TrayItems(vec![item(":1.1/a", "a"), item(":1.2/b", "b")]));

        assert_eq!(
            tray.state.drain_events(),
            vec![
                AppletEvent::AllocationChanged(Allocation::new(59, 24)),
                AppletEvent::RenderRequest,
            ]
        );

        tray.on_message(&AppletMessage::TrayItems(vec![item(":1.1/a", "a"), item(":1.2/b", "b")]));
        assert!(tray.state.drain_events().is_empty(), "identical list is a no-op");
    }
}
