use serde::{Deserialize, Serialize};

/// Recognised values of the StatusNotifierItem `Status` property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Idle; the item may be hidden by visualisations.
    Passive,
    #[default]
    Active,
    /// The item wants the user's attention and should show its attention icon.
    NeedsAttention,
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Passive" => Ok(Self::Passive),
            "Active" => Ok(Self::Active),
            "NeedsAttention" => Ok(Self::NeedsAttention),
            other => Err(format!("invalid status {other:?}")),
        }
    }
}

/// Snapshot of one StatusNotifierItem as seen by the tray host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayItem {
    /// Bus address in `{bus}{object_path}` form, unique per item.
    pub service: String,
    pub title: String,
    pub status: ItemStatus,
    pub icon_name: String,
    pub attention_icon_name: String,
    /// Extra directory to search before the icon theme (may be empty).
    pub icon_theme_path: String,
}

impl TrayItem {
    /// Icon name to display for the item's current status.
    pub fn current_icon_name(&self) -> &str {
        if self.status == ItemStatus::NeedsAttention && !self.attention_icon_name.is_empty() {
            &self.attention_icon_name
        } else {
            &self.icon_name
        }
    }
}

/// A launchable application read from a `.desktop` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopApp {
    pub id: String,
    pub name: String,
    /// Raw `Exec=` line, field codes included.
    pub exec: String,
    pub icon: Option<String>,
    pub categories: Vec<String>,
    pub no_display: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention_icon_only_when_needed() {
        let mut item = TrayItem {
            icon_name: "nm-signal-75".into(),
            attention_icon_name: "nm-no-connection".into(),
            ..Default::default()
        };
        assert_eq!(item.current_icon_name(), "nm-signal-75");
        item.status = ItemStatus::NeedsAttention;
        assert_eq!(item.current_icon_name(), "nm-no-connection");
    }

    #[test]
    fn parse_status() {
        assert_eq!("NeedsAttention".parse::<ItemStatus>(), Ok(ItemStatus::NeedsAttention));
        assert!("Sleepy".parse::<ItemStatus>().is_err());
    }
}
