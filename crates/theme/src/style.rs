use crate::colors::Color;

/// Visual settings for the panel chrome at one point of the fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStyle {
    /// Strip background, alpha already applied.
    pub background: Color,
    /// Opacity of the drop shadow under the strip (0.0 – 1.0).
    pub shadow_opacity: f32,
    pub border: Color,
}
