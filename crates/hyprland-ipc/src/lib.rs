//! Compositor IPC used for the panel's fullscreen fade.
//!
//! Only Hyprland is spoken; elsewhere [`HyprlandIpc::new`] fails and the
//! panel simply stays in its idle look.

pub mod client;
pub mod events;

pub use client::{fetch_active_workspace, HyprlandIpc};
pub use events::{parse_event, ActiveWorkspace, HyprlandEvent, WorkspaceEvent};
