pub mod colors;
pub mod fade;
pub mod style;

pub use colors::{Color, ToIced};
pub use fade::Fade;
pub use style::PanelStyle;

use colors::parse_or;
use panel_config::ThemeConfig;

/// Compiled theme derived from [`ThemeConfig`].
///
/// All colors are pre-parsed from hex strings into normalised `[0, 1]` RGBA.
/// Calling [`Theme::from_config`] is infallible; invalid color strings fall
/// back to safe defaults.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background:        Color,
    pub foreground:        Color,
    pub border:            Color,
    pub popup_background:  Color,
    pub font:              String,
    pub font_size:         f32,
    pub idle_opacity:      f32,
    pub maximized_opacity: f32,
}

impl Theme {
    /// Build a [`Theme`] from the config file's `[theme]` section.
    pub fn from_config(cfg: &ThemeConfig) -> Self {
        Self {
            background:        parse_or(&cfg.background, Color::PAPER),
            foreground:        parse_or(&cfg.foreground, Color::INK),
            border:            parse_or(&cfg.border, Color::BLACK.with_alpha(0.2)),
            popup_background:  parse_or(&cfg.popup_background, Color::PAPER),
            font:              cfg.font.clone(),
            font_size:         cfg.font_size,
            idle_opacity:      cfg.idle_opacity.clamp(0.0, 1.0),
            maximized_opacity: cfg.maximized_opacity.clamp(0.0, 1.0),
        }
    }

    /// Chrome at fade `level`: `0.0` = idle (translucent strip, full shadow),
    /// `1.0` = a window is maximized (opaque strip, no shadow).
    pub fn panel_style(&self, level: f32) -> PanelStyle {
        let level = level.clamp(0.0, 1.0);
        let opacity = self.idle_opacity + (self.maximized_opacity - self.idle_opacity) * level;
        PanelStyle {
            background:     self.background.with_alpha(opacity),
            shadow_opacity: 1.0 - level,
            border:         self.border,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}
