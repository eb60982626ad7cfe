use crate::geometry::{Allocation, Position};
use crate::state::{DesktopApp, TrayItem};
use crate::surface::Icon;

/// Notifications an applet queues for its host.
///
/// The host drains them after every call into the applet:
/// - `RenderRequest`     → repaint exactly this applet's rectangle
/// - `AllocationChanged` → full relayout (every applet packed after it moves)
/// - `Action`            → a side effect only the host can perform
#[derive(Debug, Clone, PartialEq)]
pub enum AppletEvent {
    RenderRequest,
    AllocationChanged(Allocation),
    Action(AppletAction),
}

/// Side effects applets request from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum AppletAction {
    /// Ask a StatusNotifierItem to activate (it pops up its own menu).
    /// Coordinates are absolute screen coordinates.
    ActivateTrayItem { service: String, x: i32, y: i32 },
    /// Spawn a command line (field codes already stripped).
    Launch(String),
    /// Show a popup menu below the panel.
    Popup(PopupMenu),
    /// Close whatever popup the host is showing.
    ClosePopup,
}

/// A host-drawn popup, anchored below the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupMenu {
    /// Horizontal centre of the popup in panel coordinates.
    pub anchor: Position,
    pub title: String,
    pub entries: Vec<MenuEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    /// Drawn left of the label when resolved.
    pub icon: Option<Icon>,
    pub action: MenuAction,
}

/// What happens when a popup entry is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Launch(String),
    /// Add the applet with this registry id to the layout.
    AddApplet(String),
}

/// Pointer button of a click, as far as dispatch cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    /// Right button: opens the panel's own context menu over empty space.
    Secondary,
}

/// Data produced by background collaborators and forwarded to applets on
/// the host thread.  Applets ignore the variants they don't care about.
#[derive(Debug, Clone)]
pub enum AppletMessage {
    /// Full current list of StatusNotifierItems.
    TrayItems(Vec<TrayItem>),
    /// Desktop applications finished enumerating.
    DesktopApps(Vec<DesktopApp>),
    /// The host closed the popup (chosen entry, click elsewhere, Escape).
    PopupClosed,
    /// Low-frequency periodic tick.
    Tick,
}
