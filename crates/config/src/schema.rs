use serde::{Deserialize, Serialize};

/// Root configuration structure parsed from `panel.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Global settings for the panel window.
    pub global: GlobalConfig,
    /// Ordered layout groups; this is what the panel persists.
    pub layout: Vec<GroupConfig>,
    /// Theme / visual settings.
    pub theme: ThemeConfig,
    /// Native indicator plugins loaded by the indicator applet.
    pub indicator: IndicatorConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            layout: vec![
                GroupConfig {
                    orientation: Orientation::Left,
                    position: 5,
                    objects: vec![ObjectConfig::applet("org.cream.simplepanel.MenuApplet")],
                },
                GroupConfig {
                    orientation: Orientation::Right,
                    position: 5,
                    objects: vec![
                        ObjectConfig::applet("org.cream.simplepanel.IndicatorApplet"),
                        ObjectConfig::Space { size: 5 },
                        ObjectConfig::applet("org.cream.simplepanel.ApplicationIndicatorApplet"),
                    ],
                },
            ],
            theme: ThemeConfig::default(),
            indicator: IndicatorConfig::default(),
        }
    }
}

/// Global panel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Height of the strip applets live in, in logical pixels.
    pub height: u32,
    /// Extra transparent space below the strip for the drop shadow.
    pub shadow_height: u32,
    /// Whether the panel sits at the top or the bottom.
    pub position: Position,
    /// Reserve an exclusive zone so windows don't overlap the strip.
    pub exclusive_zone: bool,
    /// How often window state is polled for the background fade (ms).
    pub poll_interval_ms: u64,
    /// Duration of the background fade (ms).
    pub fade_duration_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            height: 24,
            shadow_height: 16,
            position: Position::Top,
            exclusive_zone: true,
            poll_interval_ms: 200,
            fade_duration_ms: 500,
        }
    }
}

/// Panel position on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Top,
    Bottom,
}

/// Which panel edge a group is packed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Left,
    Right,
}

/// One anchored group in the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub orientation: Orientation,
    /// Distance from the anchoring edge in pixels.
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

/// One object inside a group: an applet reference or a fixed spacer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectConfig {
    Applet { id: String },
    Space { size: u32 },
}

impl ObjectConfig {
    pub fn applet(id: impl Into<String>) -> Self {
        Self::Applet { id: id.into() }
    }
}

/// Theme / styling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Panel background color (hex, e.g. `"#ededed"`).
    pub background: String,
    /// Label color.
    pub foreground: String,
    /// Color of the one-pixel border under the strip.
    pub border: String,
    /// Popup menu background.
    pub popup_background: String,
    /// Font family name.
    pub font: String,
    /// Label font size in points.
    pub font_size: f32,
    /// Background opacity while no window is maximized.
    pub idle_opacity: f32,
    /// Background opacity while a window is maximized or fullscreen.
    pub maximized_opacity: f32,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background:        "#ededed".to_string(),
            foreground:        "#1a1a1a".to_string(),
            border:            "#00000033".to_string(),
            popup_background:  "#f5f5f5".to_string(),
            font:              "Droid Sans".to_string(),
            font_size:         14.0,
            idle_opacity:      0.5,
            maximized_opacity: 1.0,
        }
    }
}

/// Where the indicator applet finds libindicator and its plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub libindicator: String,
    pub libgtk: String,
    pub libgdk_pixbuf: String,
    /// Directory containing `lib<name>.so` plugins.
    pub directory: String,
    /// Plugins to load, in display order.
    pub names: Vec<String>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            libindicator:  "libindicator.so".to_string(),
            libgtk:        "libgtk-x11-2.0.so.0".to_string(),
            libgdk_pixbuf: "libgdk_pixbuf-2.0.so.0".to_string(),
            directory:     "/usr/lib/indicators/4".to_string(),
            names: ["application", "networkmenu", "soundmenu", "messaging", "me", "datetime", "session"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_objects() {
        let raw = r#"
            [[layout]]
            orientation = "right"
            position = 5
            objects = [
                { type = "applet", id = "org.cream.simplepanel.ApplicationIndicatorApplet" },
                { type = "space", size = 5 },
            ]
        "#;
        let cfg: PanelConfig = toml::from_str(raw).unwrap();

        assert_eq!(cfg.layout.len(), 1);
        let group = &cfg.layout[0];
        assert_eq!(group.orientation, Orientation::Right);
        assert_eq!(group.position, 5);
        assert_eq!(
            group.objects,
            vec![
                ObjectConfig::applet("org.cream.simplepanel.ApplicationIndicatorApplet"),
                ObjectConfig::Space { size: 5 },
            ]
        );
        // untouched sections fall back to defaults
        assert_eq!(cfg.global, GlobalConfig::default());
    }

    #[test]
    fn layout_round_trips_through_toml() {
        let cfg = PanelConfig::default();
        let raw = toml::to_string(&cfg).unwrap();
        let back: PanelConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back.layout, cfg.layout);
    }

    #[test]
    fn unknown_object_type_is_rejected() {
        let raw = r#"
            [[layout]]
            orientation = "left"
            objects = [ { type = "widget", id = "x" } ]
        "#;
        assert!(toml::from_str::<PanelConfig>(raw).is_err());
    }
}
