use serde::Deserialize;

/// Events from the Hyprland event socket (`.socket2.sock`) the panel reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyprlandEvent {
    Workspace(WorkspaceEvent),
    /// Focus moved to another window; carries its class.
    ActiveWindow(String),
    Fullscreen(bool),
    MonitorFocused(String),
    /// A window opened, closed or moved between workspaces.
    WindowsChanged,
    /// Anything else, with the raw line for debugging.
    Unknown(String),
}

impl HyprlandEvent {
    /// Whether the active workspace's fullscreen state may have changed.
    pub fn affects_fullscreen(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEvent {
    pub id:   i32,
    pub name: String,
}

/// JSON shape returned by `hyprctl activeworkspace -j` (fields we use).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActiveWorkspace {
    pub id:   i32,
    pub name: String,
    #[serde(default)]
    pub windows: u32,
    /// Set for both fullscreen and maximized windows.
    #[serde(rename = "hasfullscreen", default)]
    pub has_fullscreen: bool,
}

/// Parse a raw `event>>data` line.
pub fn parse_event(line: &str) -> HyprlandEvent {
    let Some((event, data)) = line.split_once(">>") else {
        return HyprlandEvent::Unknown(line.to_string());
    };

    match event {
        "workspacev2" => {
            let (id, name) = data.split_once(',').unwrap_or((data, data));
            HyprlandEvent::Workspace(WorkspaceEvent {
                id:   id.trim().parse().unwrap_or(0),
                name: name.trim().to_string(),
            })
        }
        "workspace" => HyprlandEvent::Workspace(WorkspaceEvent {
            id:   data.trim().parse().unwrap_or(0),
            name: data.trim().to_string(),
        }),
        "activewindow" => {
            let class = data.split_once(',').map_or(data, |(class, _)| class);
            HyprlandEvent::ActiveWindow(class.trim().to_string())
        }
        "fullscreen" => HyprlandEvent::Fullscreen(data.trim() == "1"),
        "focusedmon" => {
            let monitor = data.split_once(',').map_or(data, |(m, _)| m);
            HyprlandEvent::MonitorFocused(monitor.trim().to_string())
        }
        "openwindow" | "closewindow" | "movewindow" | "movewindowv2" => HyprlandEvent::WindowsChanged,
        _ => HyprlandEvent::Unknown(line.to_string()),
    }
}
