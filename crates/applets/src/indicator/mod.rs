//! Indicator menu bar: the entries exported by libindicator plugins, each an
//! icon and/or a text label with a native menu.

pub mod native;

use crate::strip::{IconStrip, DEFAULT_HEIGHT};
use panel_config::IndicatorConfig;
use panel_core::{
    Allocation, Applet, AppletContext, AppletMessage, AppletState, Color, Icon, Pixmap,
    Position, Rect, Result, Surface, TextMeasure,
};
use panel_system::{IconCache, IconLookup};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use native::NativeBridge;

pub const ID: &str = "org.cream.simplepanel.IndicatorApplet";

/// Outer margin on both sides of the applet.
pub const PADDING: u32 = 5;
/// Gap between entries, and between an entry's icon and its label.
pub const SPACING: u32 = 3;

/// Opaque handle of an entry, stable for as long as the entry exists.
pub type EntryKey = usize;

/// What an entry shows next to (or instead of) its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryImage {
    Pixels(Pixmap),
    /// Themed icon name, resolved like any other icon.
    Named(String),
}

/// One indicator entry as copied out of the native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorEntry {
    pub key:   EntryKey,
    pub label: Option<String>,
    pub image: Option<EntryImage>,
}

/// Everything the applet needs from the native indicator stack.
pub trait IndicatorBridge: std::fmt::Debug {
    /// Load one indicator plugin (`lib<name>.so`).
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Entries of every loaded indicator, in load order.
    fn entries(&self) -> Vec<IndicatorEntry>;

    /// Run pending native events.  Returns `true` if the entry list or any
    /// entry's content changed.
    fn pump(&mut self) -> bool;

    /// Pop up the entry's native menu.
    fn popup(&mut self, entry: EntryKey) -> Result<()>;

    fn hide(&mut self, entry: EntryKey);
}

/// Where one entry's parts sit inside the applet.
#[derive(Debug, Clone, PartialEq)]
struct EntrySlot {
    /// Whole entry, full applet height.  This is what clicks are matched
    /// against.
    bounds: Rect,
    image:  Option<(Icon, Rect)>,
    label:  Option<(String, Position)>,
}

#[derive(Debug)]
pub struct IndicatorApplet {
    state:      AppletState,
    bridge:     Box<dyn IndicatorBridge>,
    icons:      Box<dyn IconLookup>,
    metrics:    Arc<dyn TextMeasure>,
    font_size:  f32,
    foreground: Color,
    entries:    Vec<IndicatorEntry>,
    slots:      Vec<EntrySlot>,
    /// Entry whose menu is currently popped up.
    open:       Option<EntryKey>,
}

impl IndicatorApplet {
    /// Open the native libraries and load every configured indicator.
    ///
    /// Fails with `ExternalBridge` only when the libraries themselves can't be
    /// loaded; individual indicators that fail are skipped.
    pub fn new(ctx: &AppletContext, config: &IndicatorConfig) -> Result<Self> {
        let bridge = NativeBridge::open(config)?;
        let paths = config
            .names
            .iter()
            .map(|name| Path::new(&config.directory).join(format!("lib{name}.so")))
            .collect::<Vec<_>>();

        Ok(Self::with_bridge(ctx, Box::new(bridge), Box::new(IconCache::default()), &paths))
    }

    pub fn with_bridge(
        ctx: &AppletContext,
        mut bridge: Box<dyn IndicatorBridge>,
        icons: Box<dyn IconLookup>,
        paths: &[PathBuf],
    ) -> Self {
        for path in paths {
            match bridge.load(path) {
                Ok(()) => info!("Loaded indicator {}", path.display()),
                Err(e) => debug!("Skipping indicator {}: {e}", path.display()),
            }
        }

        let entries = bridge.entries();
        Self {
            state: AppletState::new(),
            bridge,
            icons,
            metrics: ctx.metrics.clone(),
            font_size: ctx.font_size,
            foreground: ctx.foreground,
            entries,
            slots: Vec::new(),
            open: None,
        }
    }

    pub fn entries(&self) -> &[IndicatorEntry] {
        &self.entries
    }

    /// Lay the entries out left to right for a panel `height` pixels tall.
    /// Returns the slots and the total width.
    fn layout(&mut self, height: u32) -> (Vec<EntrySlot>, u32) {
        let icon_size = IconStrip::new(height).size;
        self.icons.set_size(icon_size as u16);

        let mut slots = Vec::with_capacity(self.entries.len());
        let mut cursor = PADDING as i32;

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                cursor += SPACING as i32;
            }
            let start = cursor;

            let image = entry.image.as_ref().and_then(|image| {
                let (icon, width, image_height) = match image {
                    EntryImage::Pixels(pixmap) => (Icon::Pixels(pixmap.clone()), pixmap.width, pixmap.height),
                    EntryImage::Named(name) => match self.icons.lookup(name, "") {
                        Ok(path) => (Icon::File(path), icon_size, icon_size),
                        Err(e) => {
                            debug!("Indicator icon hidden: {e}");
                            return None;
                        }
                    },
                };
                let y = (height as i32 - image_height as i32) / 2;
                let rect = Rect::new(cursor, y, width, image_height);
                cursor += width as i32;
                Some((icon, rect))
            });

            let label = entry.label.as_ref().map(|text| {
                if image.is_some() {
                    cursor += SPACING as i32;
                }
                let y = ((height as f32 - self.font_size) / 2.0).round() as i32;
                let origin = Position::new(cursor, y);
                cursor += self.metrics.advance(text, self.font_size) as i32;
                (text.clone(), origin)
            });

            slots.push(EntrySlot {
                bounds: Rect::new(start, 0, (cursor - start) as u32, height),
                image,
                label,
            });
        }

        let width = cursor as u32 + PADDING;
        (slots, width)
    }

    /// Pull the bridge's current entries; re-allocate and redraw if they
    /// differ from what is shown.
    fn sync(&mut self) {
        let entries = self.bridge.entries();
        if entries == self.entries {
            return;
        }
        debug!("Indicator entries changed: {} → {}", self.entries.len(), entries.len());

        if let Some(open) = self.open {
            if !entries.iter().any(|e| e.key == open) {
                self.open = None;
            }
        }
        self.entries = entries;

        let height = self.get_allocation().map_or(DEFAULT_HEIGHT, |a| a.height);
        if let Err(e) = self.allocate(height) {
            warn!("Indicator applet failed to re-allocate: {e}");
        }
        self.draw();
    }
}

impl Applet for IndicatorApplet {
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
        let (slots, width) = self.layout(height);
        self.slots = slots;
        self.set_allocation(width, height);
        Ok(Allocation::new(width, height))
    }

    fn render(&self, surface: &mut dyn Surface) {
        for slot in &self.slots {
            if let Some((icon, rect)) = &slot.image {
                surface.draw_icon(icon, *rect);
            }
            if let Some((text, origin)) = &slot.label {
                surface.draw_text(text, *origin, self.font_size, self.foreground);
            }
        }
    }

    /// Open the clicked entry's menu.  Clicking the entry whose menu is open
    /// just closes it.
    fn handle_click(&mut self, x: i32, y: i32) {
        let hit = self
            .slots
            .iter()
            .position(|slot| slot.bounds.contains(x, y))
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.key);

        if let Some(open) = self.open.take() {
            self.bridge.hide(open);
            if hit == Some(open) {
                return;
            }
        }

        let Some(key) = hit else {
            return;
        };
        match self.bridge.popup(key) {
            Ok(()) => self.open = Some(key),
            Err(e) => warn!("Indicator menu failed to open: {e}"),
        }
    }

    fn on_message(&mut self, message: &AppletMessage) {
        if matches!(message, AppletMessage::Tick) && self.bridge.pump() {
            self.sync();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{icon_path, FakeIcons};
    use panel_core::{surface::DrawOp, surface::RecordingSurface, AppletEvent, PanelError};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fixed-width metrics: 7px per character.
    #[derive(Debug)]
    struct Mono;

    impl TextMeasure for Mono {
        fn advance(&self, text: &str, _size: f32) -> u32 {
            text.chars().count() as u32 * 7
        }
    }

    #[derive(Debug, Default)]
    struct Log {
        popped: Vec<EntryKey>,
        hidden: Vec<EntryKey>,
    }

    #[derive(Debug, Default)]
    struct FakeBridge {
        loadable: Vec<PathBuf>,
        loaded:   Vec<PathBuf>,
        entries:  Rc<RefCell<Vec<IndicatorEntry>>>,
        seen:     usize,
        log:      Rc<RefCell<Log>>,
    }

    impl IndicatorBridge for FakeBridge {
        fn load(&mut self, path: &Path) -> Result<()> {
            if !self.loadable.iter().any(|p| p == path) {
                return Err(PanelError::bridge(ID, "cannot open shared object file"));
            }
            self.loaded.push(path.to_path_buf());
            Ok(())
        }

        fn entries(&self) -> Vec<IndicatorEntry> {
            self.entries.borrow().clone()
        }

        fn pump(&mut self) -> bool {
            let len = self.entries.borrow().len();
            std::mem::replace(&mut self.seen, len) != len
        }

        fn popup(&mut self, entry: EntryKey) -> Result<()> {
            self.log.borrow_mut().popped.push(entry);
            Ok(())
        }

        fn hide(&mut self, entry: EntryKey) {
            self.log.borrow_mut().hidden.push(entry);
        }
    }

    fn pixmap(width: u32, height: u32) -> Pixmap {
        Pixmap {
            width,
            height,
            rgba: vec![0u8; (width * height * 4) as usize].into(),
        }
    }

    fn entry(key: EntryKey, label: Option<&str>, image: Option<EntryImage>) -> IndicatorEntry {
        IndicatorEntry {
            key,
            label: label.map(str::to_string),
            image,
        }
    }

    fn ctx() -> AppletContext {
        AppletContext {
            metrics: Arc::new(Mono),
            ..AppletContext::default()
        }
    }

    fn applet(entries: Vec<IndicatorEntry>) -> (IndicatorApplet, Rc<RefCell<Vec<IndicatorEntry>>>, Rc<RefCell<Log>>) {
        let shared = Rc::new(RefCell::new(entries));
        let log = Rc::new(RefCell::new(Log::default()));
        let bridge = FakeBridge {
            entries: shared.clone(),
            seen: shared.borrow().len(),
            log: log.clone(),
            ..Default::default()
        };
        let mut applet = IndicatorApplet::with_bridge(&ctx(), Box::new(bridge), FakeIcons::without(&[]), &[]);
        applet.allocate(24).unwrap();
        applet.set_position(1200, 0);
        applet.state.drain_events();
        (applet, shared, log)
    }

    #[test]
    fn entries_are_packed_with_padding_and_spacing() {
        let (applet, _, _) = applet(vec![
            entry(1, None, Some(EntryImage::Pixels(pixmap(16, 16)))),
            entry(2, Some("12:30"), None),
            entry(3, Some("Me"), Some(EntryImage::Named("user-available".into()))),
        ]);

        // 5 | 16 | 3 | 35 | 3 | 22 + 3 + 14 | 5
        assert_eq!(applet.get_allocation(), Some(Allocation::new(5 + 16 + 3 + 35 + 3 + 22 + 3 + 14 + 5, 24)));

        let mut surface = RecordingSurface::new();
        applet.render(&mut surface);
        assert_eq!(
            surface.ops,
            vec![
                DrawOp::Icon { icon: Icon::Pixels(pixmap(16, 16)), rect: Rect::new(5, 4, 16, 16) },
                DrawOp::Text { text: "12:30".into(), origin: Position::new(24, 5), size: 14.0 },
                DrawOp::Icon { icon: Icon::File(icon_path("user-available")), rect: Rect::new(62, 1, 22, 22) },
                DrawOp::Text { text: "Me".into(), origin: Position::new(87, 5), size: 14.0 },
            ]
        );
    }

    #[test]
    fn no_entries_is_just_padding() {
        let (applet, _, _) = applet(Vec::new());
        assert_eq!(applet.get_allocation(), Some(Allocation::new(10, 24)));
    }

    #[test]
    fn clicks_hit_the_painted_entry() {
        let (mut applet, _, log) = applet(vec![
            entry(10, Some("a"), None),
            entry(20, None, Some(EntryImage::Pixels(pixmap(20, 20)))),
        ]);

        let mut surface = RecordingSurface::new();
        applet.render(&mut surface);
        let icon = surface.icon_rects()[0];

        applet.handle_click(icon.right(), icon.bottom());
        assert_eq!(log.borrow().popped, vec![20]);

        // "a" spans 5..=12
        applet.handle_click(12, 0);
        assert_eq!(log.borrow().hidden, vec![20]);
        assert_eq!(log.borrow().popped, vec![20, 10]);
    }

    #[test]
    fn clicking_the_open_entry_closes_it() {
        let (mut applet, _, log) = applet(vec![entry(7, Some("vol"), None)]);

        applet.handle_click(6, 10);
        applet.handle_click(6, 10);
        assert_eq!(log.borrow().popped, vec![7]);
        assert_eq!(log.borrow().hidden, vec![7]);

        applet.handle_click(6, 10);
        assert_eq!(log.borrow().popped, vec![7, 7]);
    }

    #[test]
    fn clicking_outside_entries_only_closes() {
        let (mut applet, _, log) = applet(vec![entry(7, Some("vol"), None)]);
        applet.handle_click(6, 10);
        applet.handle_click(1, 10);
        assert_eq!(log.borrow().hidden, vec![7]);
        assert_eq!(log.borrow().popped, vec![7]);
    }

    #[test]
    fn tick_picks_up_new_entries() {
        let (mut applet, shared, _) = applet(vec![entry(1, Some("a"), None)]);

        applet.on_message(&AppletMessage::Tick);
        assert!(applet.state.drain_events().is_empty(), "nothing changed");

        shared.borrow_mut().push(entry(2, Some("bb"), None));
        applet.on_message(&AppletMessage::Tick);
        assert_eq!(
            applet.state.drain_events(),
            vec![
                AppletEvent::AllocationChanged(Allocation::new(5 + 7 + 3 + 14 + 5, 24)),
                AppletEvent::RenderRequest,
            ]
        );
        assert_eq!(applet.entries().len(), 2);
    }

    #[test]
    fn unloadable_indicators_are_skipped() {
        let bridge = FakeBridge {
            loadable: vec![PathBuf::from("/usr/lib/indicators/4/libdatetime.so")],
            ..Default::default()
        };
        let paths = ["application", "datetime"]
            .map(|n| PathBuf::from(format!("/usr/lib/indicators/4/lib{n}.so")));

        let applet = IndicatorApplet::with_bridge(&ctx(), Box::new(bridge), FakeIcons::without(&[]), &paths);
        assert!(applet.entries().is_empty());
        assert_eq!(format!("{:?}", applet.bridge).matches("libdatetime").count(), 2);
    }
}
