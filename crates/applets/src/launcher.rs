//! Application launcher: one icon per menu category, each opening a popup of
//! the category's applications.

use crate::strip::{IconStrip, DEFAULT_HEIGHT};
use panel_core::{
    state::DesktopApp, Allocation, Applet, AppletAction, AppletContext, AppletMessage, AppletState,
    Icon, MenuAction, MenuEntry, PopupMenu, Position, Result, Surface,
};
use panel_system::{strip_field_codes, IconCache, IconLookup};
use std::path::PathBuf;
use tracing::{debug, info};

pub const ID: &str = "org.cream.simplepanel.MenuApplet";

/// Menu categories in display order, with their themed icon.
pub const CATEGORIES: [(&str, &str); 9] = [
    ("Network", "applications-internet"),
    ("Graphics", "applications-graphics"),
    ("Office", "applications-office"),
    ("Development", "applications-development"),
    ("Audio", "applications-multimedia"),
    ("Game", "applications-games"),
    ("Utility", "applications-other"),
    ("System", "applications-system"),
    ("Settings", "applications-engineering"),
];

#[derive(Debug, Clone)]
struct Category {
    id:        &'static str,
    icon_name: &'static str,
    apps:      Vec<DesktopApp>,
}

#[derive(Debug)]
pub struct LauncherApplet {
    state:      AppletState,
    categories: Vec<Category>,
    icons:      Box<dyn IconLookup>,
    /// `(index into categories, icon file)` for every category with an icon.
    shown:      Vec<(usize, PathBuf)>,
    /// Category whose popup is currently open.
    open:       Option<usize>,
}

impl LauncherApplet {
    pub fn new(ctx: &AppletContext) -> Result<Self> {
        Ok(Self::with_icons(ctx, Box::new(IconCache::default())))
    }

    pub fn with_icons(_ctx: &AppletContext, icons: Box<dyn IconLookup>) -> Self {
        Self {
            state: AppletState::new(),
            categories: CATEGORIES
                .iter()
                .map(|&(id, icon_name)| Category {
                    id,
                    icon_name,
                    apps: Vec::new(),
                })
                .collect(),
            icons,
            shown: Vec::new(),
            open: None,
        }
    }

    /// Sort `apps` into the categories.  An application listing several
    /// categories shows up in each; `NoDisplay` entries nowhere.
    pub fn fill(&mut self, apps: &[DesktopApp]) {
        for category in &mut self.categories {
            category.apps = apps
                .iter()
                .filter(|app| !app.no_display && app.categories.iter().any(|c| c == category.id))
                .cloned()
                .collect();
            category
                .apps
                .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }

        let total: usize = self.categories.iter().map(|c| c.apps.len()).sum();
        info!("Launcher menu filled with {total} entries");
    }

    /// Applications listed under `category` (empty for unknown names).
    pub fn apps(&self, category: &str) -> &[DesktopApp] {
        self.categories
            .iter()
            .find(|c| c.id == category)
            .map(|c| c.apps.as_slice())
            .unwrap_or_default()
    }

    fn strip(&self) -> IconStrip {
        IconStrip::for_allocation(self.get_allocation())
    }

    fn popup_for(&mut self, index: usize, anchor: Position) -> PopupMenu {
        let category = &self.categories[index];
        let icons = &mut self.icons;
        PopupMenu {
            anchor,
            title: category.id.to_string(),
            entries: category
                .apps
                .iter()
                .map(|app| MenuEntry {
                    label: app.name.clone(),
                    icon: app
                        .icon
                        .as_deref()
                        .and_then(|name| icons.lookup(name, "").ok())
                        .map(Icon::File),
                    action: MenuAction::Launch(strip_field_codes(&app.exec)),
                })
                .collect(),
        }
    }
}

impl Applet for LauncherApplet {
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
        for (index, category) in self.categories.iter().enumerate() {
            match self.icons.lookup(category.icon_name, "") {
                Ok(path) => self.shown.push((index, path)),
                Err(e) => debug!("Hiding category {}: {e}", category.id),
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

    /// Toggle the clicked category's popup; any other open popup closes first.
    fn handle_click(&mut self, x: i32, y: i32) {
        let strip = self.strip();
        let Some(k) = strip.slot_at(self.shown.len(), x, y) else {
            return;
        };
        let index = self.shown[k].0;

        if let Some(open) = self.open.take() {
            self.state.request(AppletAction::ClosePopup);
            if open == index {
                return;
            }
        }

        let slot = strip.slot(k);
        let origin = self.get_position().unwrap_or_default();
        let height = self.get_allocation().map_or(DEFAULT_HEIGHT, |a| a.height);
        let anchor = Position::new(
            origin.x + slot.x + slot.width as i32 / 2,
            origin.y + height as i32,
        );

        let menu = self.popup_for(index, anchor);
        self.state.request(AppletAction::Popup(menu));
        self.open = Some(index);
    }

    fn on_message(&mut self, message: &AppletMessage) {
        match message {
            AppletMessage::DesktopApps(apps) => self.fill(apps),
            AppletMessage::PopupClosed => self.open = None,
            _ => {}
        }
    }
}
