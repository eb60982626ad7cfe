//! The panel render pass.
//!
//! Chrome first, then every applet in stored group/object order, each inside
//! its own translated and clipped scope so that nothing one applet does to
//! the drawing state leaks into its siblings.  A damage region limits the
//! pass to the applets it touches.

use crate::{damage::Damage, layout::LayoutModel};
use panel_core::{Applet, Rect, Surface};
use panel_theme::PanelStyle;

/// Which applets, in stored order, have to be repainted for `damage`.
/// Applets not laid out yet never are.
pub fn damaged<'a>(model: &'a LayoutModel, damage: &'a Damage) -> impl Iterator<Item = bool> + 'a {
    model
        .applets()
        .map(|applet| applet.state().rect().is_some_and(|r| damage.intersects(&r)))
}

/// Paint one applet inside a scope matching its position and allocation.
/// Returns `false` (and paints nothing) for applets not yet laid out.
pub fn paint_applet(applet: &dyn Applet, surface: &mut dyn Surface) -> bool {
    let (Some(position), Some(allocation)) = (applet.get_position(), applet.get_allocation()) else {
        tracing::debug!("Skipping '{}': not laid out yet", applet.id());
        return false;
    };

    surface.with_scope(position, allocation, &mut |scope| applet.render(scope));
    true
}

/// Rows of the drop shadow under the strip, top to bottom.
const SHADOW_STEPS: [f32; 4] = [0.18, 0.10, 0.05, 0.02];

/// Background, one-pixel border and drop shadow, drawn under all applets.
pub fn paint_chrome(surface: &mut dyn Surface, style: &PanelStyle, width: u32, height: u32) {
    surface.fill_rect(Rect::new(0, 0, width, height), style.background);
    surface.fill_rect(Rect::new(0, height as i32 - 1, width, 1), style.border);

    if style.shadow_opacity > 0.0 {
        for (row, alpha) in SHADOW_STEPS.iter().enumerate() {
            let color = panel_core::Color::BLACK.with_alpha(alpha * style.shadow_opacity);
            surface.fill_rect(Rect::new(0, height as i32 + row as i32, width, 1), color);
        }
    }
}
