//! Layout and drawing engine for the panel.
//!
//! - [`layout`]: the layout model and the packing engine
//! - [`dispatch`]: hit-testing and click delivery
//! - [`compositor`]: the per-applet scoped render pass
//! - [`panel`]: the host tying the above to an applet registry

pub mod compositor;
pub mod damage;
pub mod dispatch;
pub mod layout;
pub mod panel;

pub use damage::Damage;
pub use dispatch::{locate_and_dispatch, Dispatch};
pub use layout::{LayoutGroup, LayoutModel, LayoutObject, Orientation};
pub use panel::Panel;
