pub mod applet;
pub mod error;
pub mod event;
pub mod geometry;
pub mod registry;
pub mod state;
pub mod surface;

pub use applet::{Applet, AppletState};
pub use error::{PanelError, Result};
pub use event::{AppletAction, AppletEvent, AppletMessage, MenuAction, MenuEntry, MouseButton, PopupMenu};
pub use geometry::{Allocation, Color, Position, Rect};
pub use registry::{AppletContext, AppletManifest, AppletRegistry};
pub use surface::{Icon, Pixmap, Surface, TextMeasure};
