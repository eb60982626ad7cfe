use crate::{
    error::Result,
    event::{AppletAction, AppletEvent, AppletMessage},
    geometry::{Allocation, Position, Rect},
    surface::Surface,
};

/// Host-visible state every applet carries: its allocation, its position and
/// the queue of notifications waiting for the host.
#[derive(Debug, Default)]
pub struct AppletState {
    allocation: Option<Allocation>,
    position:   Option<Position>,
    events:     Vec<AppletEvent>,
}

impl AppletState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the applet sized itself for the first time.
    pub fn allocation(&self) -> Option<Allocation> {
        self.allocation
    }

    /// Store a new allocation and queue `AllocationChanged`.
    ///
    /// Only the applet itself calls this, after recomputing its content size.
    pub fn set_allocation(&mut self, width: u32, height: u32) {
        let allocation = Allocation::new(width, height);
        self.allocation = Some(allocation);
        self.events.push(AppletEvent::AllocationChanged(allocation));
    }

    /// `None` until the first relayout placed the applet.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Written by the layout engine only.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = Some(Position::new(x, y));
    }

    /// Panel-space rectangle, if the applet is both sized and placed.
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::from_parts(self.position?, self.allocation?))
    }

    /// Queue a repaint of this applet's rectangle.
    pub fn request_render(&mut self) {
        if !self.events.contains(&AppletEvent::RenderRequest) {
            self.events.push(AppletEvent::RenderRequest);
        }
    }

    pub fn request(&mut self, action: AppletAction) {
        self.events.push(AppletEvent::Action(action));
    }

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<AppletEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// A unit of panel content: sizes itself, renders into a drawing scope and
/// reacts to clicks.
///
/// Applets never touch the layout directly.  They report through the queue in
/// their [`AppletState`]; the host drains it and re-lays out or repaints.
pub trait Applet: std::fmt::Debug {
    /// Reverse-DNS registry identifier, e.g. `"org.cream.simplepanel.MenuApplet"`.
    fn id(&self) -> &str;

    fn state(&self) -> &AppletState;

    fn state_mut(&mut self) -> &mut AppletState;

    /// Recompute the content size for the given panel height and report it
    /// through [`AppletState::set_allocation`].
    ///
    /// A failing applet is treated as zero-size for the current pass.
    fn allocate(&mut self, height: u32) -> Result<Allocation>;

    /// Paint into a scope whose origin sits at the applet's position and whose
    /// clip equals its allocation.
    fn render(&self, surface: &mut dyn Surface);

    /// Pointer release at applet-local coordinates.
    fn handle_click(&mut self, _x: i32, _y: i32) {}

    /// Data forwarded from background collaborators.
    fn on_message(&mut self, _message: &AppletMessage) {}

    // ── Provided ──────────────────────────────────────────────────────────────

    fn get_allocation(&self) -> Option<Allocation> {
        self.state().allocation()
    }

    fn set_allocation(&mut self, width: u32, height: u32) {
        self.state_mut().set_allocation(width, height);
    }

    fn get_position(&self) -> Option<Position> {
        self.state().position()
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.state_mut().set_position(x, y);
    }

    /// Ask the host to repaint this applet.
    fn draw(&mut self) {
        self.state_mut().request_render();
    }
}
