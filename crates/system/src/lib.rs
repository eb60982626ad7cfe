//! Desktop-side collaborators of the panel.
//!
//! Everything here either runs on a background Tokio task and reports through
//! a channel, or is a plain lookup the applets call on the host thread.

pub mod dbus;
pub mod desktop;
pub mod icons;
pub mod launch;
pub mod tray;

pub use desktop::spawn_scan;
pub use icons::{IconCache, IconLookup};
pub use launch::{launch, strip_field_codes};
pub use tray::spawn_host;
