//! Test doubles shared by the applet tests.

use panel_core::{PanelError, Result};
use panel_system::IconLookup;
use std::collections::HashSet;
use std::path::PathBuf;

/// Resolves every icon to `/icons/<name>.png` except the ones marked missing.
#[derive(Debug, Default)]
pub struct FakeIcons {
    pub missing: HashSet<String>,
    pub size: u16,
}

impl FakeIcons {
    pub fn without(names: &[&str]) -> Box<Self> {
        Box::new(Self {
            missing: names.iter().map(|n| n.to_string()).collect(),
            size: 0,
        })
    }
}

impl IconLookup for FakeIcons {
    fn lookup(&mut self, name: &str, _theme_path: &str) -> Result<PathBuf> {
        if name.is_empty() || self.missing.contains(name) {
            return Err(PanelError::ResourceLookup(format!("icon '{name}'")));
        }
        Ok(PathBuf::from(format!("/icons/{name}.png")))
    }

    fn set_size(&mut self, size: u16) {
        self.size = size;
    }
}

pub fn icon_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/icons/{name}.png"))
}
