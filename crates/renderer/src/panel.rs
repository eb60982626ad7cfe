//! Toolkit-neutral panel host.
//!
//! Owns the live layout and the applet registry, drains applet notifications,
//! keeps positions current and tracks which regions need repainting.  The
//! windowing glue only forwards input, sizes and repaint requests.

use crate::{
    damage::Damage,
    dispatch::{locate_and_dispatch, Dispatch},
    layout::{LayoutGroup, LayoutModel, LayoutObject, Orientation},
};
use panel_config::GroupConfig;
use panel_core::{
    Applet, AppletAction, AppletContext, AppletEvent, AppletManifest, AppletMessage,
    AppletRegistry, MenuAction, MenuEntry, MouseButton, PopupMenu, Position, Rect, Result,
};
use tracing::{debug, info, warn};

pub struct Panel {
    model:    LayoutModel,
    registry: AppletRegistry,
    ctx:      AppletContext,
    width:    u32,
    damage:   Damage,
    latest:   Snapshots,
}

/// The last broadcast of each kind of collaborator data.  Collaborators only
/// report changes, so applets created later are handed these on arrival.
#[derive(Debug, Default)]
struct Snapshots {
    tray:    Option<AppletMessage>,
    desktop: Option<AppletMessage>,
}

impl Snapshots {
    fn record(&mut self, message: &AppletMessage) {
        match message {
            AppletMessage::TrayItems(_) => self.tray = Some(message.clone()),
            AppletMessage::DesktopApps(_) => self.desktop = Some(message.clone()),
            AppletMessage::PopupClosed | AppletMessage::Tick => {}
        }
    }

    fn replay(&self, applet: &mut dyn Applet) {
        for message in self.tray.iter().chain(&self.desktop) {
            applet.on_message(message);
        }
    }
}

impl Panel {
    /// An empty panel.  Empty is a valid, fully responsive state.
    pub fn new(registry: AppletRegistry, ctx: AppletContext, width: u32) -> Self {
        Self {
            model: LayoutModel::new(),
            registry,
            ctx,
            width,
            damage: Damage::new(),
            latest: Snapshots::default(),
        }
    }

    /// Replace the live layout with `layout`, instantiating every applet it
    /// names.  Applets that fail to construct are left out (and logged).
    pub fn load(&mut self, layout: &[GroupConfig]) {
        let registry = &self.registry;
        let ctx = &self.ctx;

        self.model = LayoutModel::from_config(layout, |id| {
            registry
                .instantiate(id, ctx)
                .map_err(|e| warn!("Omitting applet '{id}': {e}"))
                .ok()
        });

        let height = self.ctx.height;
        for applet in self.model.applets_mut() {
            allocate(applet, height);
            self.latest.replay(applet);
        }

        info!(
            "Loaded {} applet(s) in {} group(s)",
            self.model.applets().count(),
            self.model.groups.len()
        );

        self.pump();
        self.relayout();
    }

    /// Append a new instance of `id` to the first group (a left group is
    /// created when the layout has none).
    pub fn add_applet(&mut self, id: &str) -> Result<()> {
        let mut instance = self.registry.instantiate(id, &self.ctx)?;
        allocate(instance.as_mut(), self.ctx.height);
        self.latest.replay(instance.as_mut());

        if self.model.groups.is_empty() {
            self.model.groups.push(LayoutGroup::new(Orientation::Left, 0));
        }
        self.model.groups[0].objects.push(LayoutObject::Applet {
            id: id.to_string(),
            instance,
        });

        info!("Added applet '{id}'");
        self.pump();
        self.relayout();
        Ok(())
    }

    /// Remove the first applet registered as `id`.  Returns `false` if the
    /// layout holds no such applet.
    pub fn remove_applet(&mut self, id: &str) -> bool {
        for group in &mut self.model.groups {
            let found = group
                .objects
                .iter()
                .position(|o| matches!(o, LayoutObject::Applet { id: oid, .. } if oid == id));
            if let Some(index) = found {
                group.objects.remove(index);
                info!("Removed applet '{id}'");
                self.relayout();
                return true;
            }
        }
        false
    }

    /// Recompute every position and mark the whole panel dirty.
    pub fn relayout(&mut self) {
        self.model.relayout(self.width);
        self.damage.add(self.bounds());
    }

    /// Drain every applet's notification queue.
    ///
    /// Any number of allocation changes collapse into one relayout; render
    /// requests damage exactly the requesting applet's rectangle.  Actions are
    /// returned for the windowing glue to carry out.
    pub fn pump(&mut self) -> Vec<AppletAction> {
        let mut needs_relayout = false;
        let mut repaint = Vec::new();
        let mut actions = Vec::new();

        for applet in self.model.applets_mut() {
            if !applet.state().has_events() {
                continue;
            }
            let rect = applet.state().rect();
            for event in applet.state_mut().drain_events() {
                match event {
                    AppletEvent::AllocationChanged(allocation) => {
                        debug!("'{}' allocation → {}x{}", applet.id(), allocation.width, allocation.height);
                        needs_relayout = true;
                    }
                    AppletEvent::RenderRequest => repaint.extend(rect),
                    AppletEvent::Action(action) => actions.push(action),
                }
            }
        }

        // a relayout already damages the whole panel
        if needs_relayout {
            self.relayout();
        } else {
            for rect in repaint {
                self.damage.add(rect);
            }
        }

        actions
    }

    /// Deliver a pointer release at panel coordinates.
    pub fn click(&mut self, px: i32, py: i32, button: MouseButton) -> Dispatch {
        locate_and_dispatch(&mut self.model, px, py, button)
    }

    /// Forward collaborator data to every applet.
    pub fn broadcast(&mut self, message: &AppletMessage) {
        self.latest.record(message);
        for applet in self.model.applets_mut() {
            applet.on_message(message);
        }
    }

    /// The toolkit reported a new window width.
    pub fn set_width(&mut self, width: u32) {
        if width != self.width {
            debug!("Panel width {} → {width}", self.width);
            self.width = width;
            self.relayout();
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.ctx.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.ctx.height)
    }

    pub fn take_damage(&mut self) -> Damage {
        self.damage.take()
    }

    pub fn model(&self) -> &LayoutModel {
        &self.model
    }

    pub fn registry(&self) -> &AppletRegistry {
        &self.registry
    }

    /// The live layout in its persistence form.
    pub fn snapshot_layout(&self) -> Vec<GroupConfig> {
        self.model.snapshot()
    }

    /// Registered applets not currently in the layout.
    pub fn addable_applets(&self) -> Vec<&AppletManifest> {
        self.registry
            .manifests()
            .into_iter()
            .filter(|m| !self.model.contains(&m.id))
            .collect()
    }

    /// The panel's own popup shown for a secondary click on empty space.
    pub fn context_menu(&self, at: Position) -> PopupMenu {
        PopupMenu {
            anchor: at,
            title: "Add applet".to_string(),
            entries: self
                .addable_applets()
                .into_iter()
                .map(|m| MenuEntry {
                    label: m.name.clone(),
                    icon: None,
                    action: MenuAction::AddApplet(m.id.clone()),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("width", &self.width)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Ask an applet to size itself; a failure leaves it zero-size for this pass.
fn allocate(applet: &mut dyn Applet, height: u32) {
    if let Err(e) = applet.allocate(height) {
        warn!("'{}' failed to allocate: {e}; treating as zero-size", applet.id());
        applet.set_allocation(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::Fixed;
    use panel_config::ObjectConfig;
    use panel_core::{
        state::{DesktopApp, TrayItem},
        Allocation, AppletState, PanelError, Surface,
    };

    /// Grows by 10px on every click and asks to be repainted on ticks.
    #[derive(Debug, Default)]
    struct Growing {
        state: AppletState,
        width: u32,
    }

    impl Applet for Growing {
        fn id(&self) -> &str {
            "test.Growing"
        }
        fn state(&self) -> &AppletState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut AppletState {
            &mut self.state
        }
        fn allocate(&mut self, height: u32) -> Result<Allocation> {
            self.set_allocation(self.width, height);
            Ok(Allocation::new(self.width, height))
        }
        fn render(&self, _surface: &mut dyn Surface) {}
        fn handle_click(&mut self, _x: i32, _y: i32) {
            self.width += 10;
            let height = self.get_allocation().map_or(24, |a| a.height);
            let _ = self.allocate(height);
            self.state.request(AppletAction::Launch("xterm".into()));
        }
        fn on_message(&mut self, message: &AppletMessage) {
            if matches!(message, AppletMessage::Tick) {
                self.draw();
            }
        }
    }

    #[derive(Debug, Default)]
    struct Broken {
        state: AppletState,
    }

    impl Applet for Broken {
        fn id(&self) -> &str {
            "test.Broken"
        }
        fn state(&self) -> &AppletState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut AppletState {
            &mut self.state
        }
        fn allocate(&mut self, _height: u32) -> Result<Allocation> {
            Err(PanelError::ResourceLookup("icon 'missing'".into()))
        }
        fn render(&self, _surface: &mut dyn Surface) {}
    }

    /// Widens by 10px per tray or desktop snapshot plus 1px per tray item in
    /// the last one; a click only asks for a repaint.
    #[derive(Debug, Default)]
    struct Listener {
        state:      AppletState,
        snapshots:  u32,
        tray_items: u32,
    }

    impl Applet for Listener {
        fn id(&self) -> &str {
            "test.Listener"
        }
        fn state(&self) -> &AppletState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut AppletState {
            &mut self.state
        }
        fn allocate(&mut self, height: u32) -> Result<Allocation> {
            let width = 20 + 10 * self.snapshots + self.tray_items;
            self.set_allocation(width, height);
            Ok(Allocation::new(width, height))
        }
        fn render(&self, _surface: &mut dyn Surface) {}
        fn handle_click(&mut self, _x: i32, _y: i32) {
            self.draw();
        }
        fn on_message(&mut self, message: &AppletMessage) {
            match message {
                AppletMessage::TrayItems(items) => self.tray_items = items.len() as u32,
                AppletMessage::DesktopApps(_) => {}
                AppletMessage::PopupClosed | AppletMessage::Tick => return,
            }
            self.snapshots += 1;
            let height = self.get_allocation().map_or(24, |a| a.height);
            let _ = self.allocate(height);
        }
    }

    fn registry() -> AppletRegistry {
        let mut registry = AppletRegistry::new();
        registry.register(AppletManifest::new("test.Growing", "Growing", ""), |_| {
            Ok(Box::new(Growing { width: 20, ..Default::default() }))
        });
        registry.register(AppletManifest::new("test.Fixed", "Fixed", ""), |_| {
            Ok(Fixed::boxed("test.Fixed", Some(30)))
        });
        registry.register(AppletManifest::new("test.Listener", "Listener", ""), |_| {
            Ok(Box::new(Listener::default()))
        });
        registry.register(AppletManifest::new("test.Broken", "Broken", ""), |_| {
            Ok(Box::new(Broken::default()))
        });
        registry.register(AppletManifest::new("test.NoBridge", "No bridge", ""), |_| {
            Err(PanelError::bridge("test.NoBridge", "library not found"))
        });
        registry
    }

    fn layout(objects: Vec<ObjectConfig>) -> Vec<GroupConfig> {
        vec![GroupConfig {
            orientation: Orientation::Left,
            position: 5,
            objects,
        }]
    }

    fn position_of(panel: &Panel, id: &str) -> Option<Position> {
        panel.model().applets().find(|a| a.id() == id)?.get_position()
    }

    #[test]
    fn load_sizes_and_places_applets() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 1440);
        panel.load(&layout(vec![
            ObjectConfig::applet("test.Growing"),
            ObjectConfig::Space { size: 5 },
            ObjectConfig::applet("test.Fixed"),
        ]));

        assert_eq!(position_of(&panel, "test.Growing"), Some(Position::new(5, 0)));
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(30, 0)));
        assert_eq!(panel.take_damage().bounds(), Some(Rect::new(0, 0, 1440, 24)));
    }

    #[test]
    fn allocation_change_shifts_later_applets() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 1440);
        panel.load(&layout(vec![ObjectConfig::applet("test.Growing"), ObjectConfig::applet("test.Fixed")]));
        panel.take_damage();

        let outcome = panel.click(6, 3, MouseButton::Primary);
        assert!(matches!(outcome, Dispatch::Applet { ref id, .. } if id == "test.Growing"));

        let actions = panel.pump();
        assert_eq!(actions, vec![AppletAction::Launch("xterm".into())]);
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(35, 0)));
        assert_eq!(panel.take_damage().bounds(), Some(panel.bounds()), "relayout repaints everything");
    }

    #[test]
    fn render_request_damages_only_that_applet() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 1440);
        panel.load(&layout(vec![ObjectConfig::applet("test.Fixed"), ObjectConfig::applet("test.Growing")]));
        panel.take_damage();

        panel.broadcast(&AppletMessage::Tick);
        assert!(panel.pump().is_empty());
        assert_eq!(panel.take_damage().rects(), &[Rect::new(35, 0, 20, 24)]);
    }

    #[test]
    fn failing_applets_do_not_take_the_panel_down() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&layout(vec![
            ObjectConfig::applet("test.NoBridge"),
            ObjectConfig::applet("test.Broken"),
            ObjectConfig::applet("org.example.NotRegistered"),
            ObjectConfig::applet("test.Fixed"),
        ]));

        assert!(!panel.model().contains("test.NoBridge"));
        assert_eq!(
            panel.model().applets().find(|a| a.id() == "test.Broken").and_then(|a| a.get_allocation()),
            Some(Allocation::ZERO)
        );
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(5, 0)));

        // omitted applets survive a save
        assert_eq!(panel.snapshot_layout()[0].objects.len(), 4);
    }

    #[test]
    fn every_applet_failing_leaves_an_empty_working_panel() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&layout(vec![ObjectConfig::applet("test.NoBridge")]));

        assert!(panel.model().is_empty());
        assert_eq!(panel.click(10, 10, MouseButton::Primary), Dispatch::Ignored);
        assert!(matches!(panel.click(10, 10, MouseButton::Secondary), Dispatch::ContextMenu { .. }));
    }

    #[test]
    fn add_and_remove_applets() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&[]);

        panel.add_applet("test.Fixed").unwrap();
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(0, 0)));
        assert!(matches!(panel.add_applet("nope"), Err(PanelError::UnknownApplet(_))));

        let menu = panel.context_menu(Position::new(400, 10));
        let offered: Vec<_> = menu.entries.iter().map(|e| e.action.clone()).collect();
        assert!(!offered.contains(&MenuAction::AddApplet("test.Fixed".into())));
        assert!(offered.contains(&MenuAction::AddApplet("test.Growing".into())));

        assert!(panel.remove_applet("test.Fixed"));
        assert!(!panel.remove_applet("test.Fixed"));
        assert!(panel.model().is_empty());
    }

    fn listener_width(panel: &Panel) -> Option<u32> {
        let listener = panel.model().applets().find(|a| a.id() == "test.Listener")?;
        listener.get_allocation().map(|a| a.width)
    }

    #[test]
    fn applets_created_later_receive_the_latest_snapshots() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&[]);
        panel.broadcast(&AppletMessage::DesktopApps(vec![DesktopApp::default()]));
        panel.broadcast(&AppletMessage::TrayItems(Vec::new()));
        panel.broadcast(&AppletMessage::TrayItems(vec![TrayItem::default()]));
        panel.broadcast(&AppletMessage::Tick);

        panel.add_applet("test.Listener").unwrap();
        assert_eq!(listener_width(&panel), Some(20 + 2 * 10 + 1), "latest tray and desktop only");

        panel.load(&layout(vec![ObjectConfig::applet("test.Listener")]));
        assert_eq!(listener_width(&panel), Some(41));
        assert_eq!(position_of(&panel, "test.Listener"), Some(Position::new(5, 0)));
    }

    #[test]
    fn nothing_is_replayed_before_the_first_broadcast() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&layout(vec![ObjectConfig::applet("test.Listener")]));
        assert_eq!(listener_width(&panel), Some(20));
    }

    #[test]
    fn repaint_of_a_duplicate_instance_damages_its_own_rect() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 800);
        panel.load(&layout(vec![ObjectConfig::applet("test.Listener"), ObjectConfig::applet("test.Listener")]));
        panel.take_damage();

        let outcome = panel.click(30, 3, MouseButton::Primary);
        assert!(matches!(outcome, Dispatch::Applet { ref id, .. } if id == "test.Listener"));
        panel.pump();

        assert_eq!(panel.take_damage().rects(), &[Rect::new(25, 0, 20, 24)]);
    }

    #[test]
    fn resize_relayouts_right_groups() {
        let mut panel = Panel::new(registry(), AppletContext::default(), 1000);
        panel.load(&[GroupConfig {
            orientation: Orientation::Right,
            position: 0,
            objects: vec![ObjectConfig::applet("test.Fixed")],
        }]);
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(970, 0)));

        panel.set_width(1440);
        assert_eq!(position_of(&panel, "test.Fixed"), Some(Position::new(1410, 0)));
    }
}
