//! The applets shipped with the panel.
//!
//! | id | applet |
//! |---|---|
//! | `org.cream.simplepanel.ApplicationIndicatorApplet` | [`TrayApplet`] |
//! | `org.cream.simplepanel.IndicatorApplet` | [`IndicatorApplet`] |
//! | `org.cream.simplepanel.MenuApplet` | [`LauncherApplet`] |

pub mod indicator;
pub mod launcher;
pub mod registry;
pub mod strip;
pub mod tray;

pub use indicator::{IndicatorApplet, IndicatorBridge};
pub use launcher::LauncherApplet;
pub use registry::builtin_registry;
pub use tray::TrayApplet;

#[cfg(test)]
pub(crate) mod testing;
