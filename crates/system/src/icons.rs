use panel_core::{PanelError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Icon size used when nothing better is known.
pub const DEFAULT_ICON_SIZE: u16 = 22;

const EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

/// How deep to descend into an item's private theme directory.
const MAX_THEME_DEPTH: usize = 4;

/// Resolves icon names to files, remembering every answer.
///
/// Lookups are keyed on `(name, extra search directory)`, misses included,
/// so a broken icon costs one filesystem walk per panel run rather than one
/// per repaint.
#[derive(Debug)]
pub struct IconCache {
    size:     u16,
    resolved: HashMap<(String, String), Option<PathBuf>>,
}

impl IconCache {
    pub fn new(size: u16) -> Self {
        Self {
            size,
            resolved: HashMap::new(),
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// Change the preferred size.  Forgets everything resolved so far.
    pub fn set_size(&mut self, size: u16) {
        if size != self.size {
            self.size = size;
            self.resolved.clear();
        }
    }

    /// Find the file for `name`.
    ///
    /// Absolute paths are taken as-is.  Otherwise `theme_path` (a directory
    /// shipped by the application, may be empty) is searched first, then the
    /// user's icon theme and its fallbacks.
    pub fn lookup(&mut self, name: &str, theme_path: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(PanelError::ResourceLookup("empty icon name".into()));
        }

        let key = (name.to_string(), theme_path.to_string());
        let size = self.size;
        let found = self
            .resolved
            .entry(key)
            .or_insert_with(|| resolve(name, theme_path, size))
            .clone();

        found.ok_or_else(|| PanelError::ResourceLookup(format!("icon '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Name → file resolution as the applets see it.
pub trait IconLookup: std::fmt::Debug {
    fn lookup(&mut self, name: &str, theme_path: &str) -> Result<PathBuf>;

    /// Preferred pixel size for subsequent lookups.
    fn set_size(&mut self, size: u16);
}

impl IconLookup for IconCache {
    fn lookup(&mut self, name: &str, theme_path: &str) -> Result<PathBuf> {
        IconCache::lookup(self, name, theme_path)
    }

    fn set_size(&mut self, size: u16) {
        IconCache::set_size(self, size);
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_SIZE)
    }
}

fn resolve(name: &str, theme_path: &str, size: u16) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }

    if !theme_path.is_empty() {
        if let Some(found) = search_dir(Path::new(theme_path), name, MAX_THEME_DEPTH) {
            debug!("Icon '{name}' → {} (item theme path)", found.display());
            return Some(found);
        }
    }

    let found = freedesktop_icons::lookup(name).with_size(size).with_cache().find();
    match &found {
        Some(path) => debug!("Icon '{name}' → {}", path.display()),
        None => debug!("Icon '{name}' not found"),
    }
    found
}

/// Depth-first search for `name.{png,svg,xpm}` below `dir`.
fn search_dir(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    for ext in EXTENSIONS {
        let candidate = dir.join(format!("{name}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if depth == 0 {
        return None;
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    subdirs
        .iter()
        .find_map(|sub| search_dir(sub, name, depth - 1))
}
