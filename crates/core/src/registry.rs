use crate::{
    applet::Applet,
    error::{PanelError, Result},
    geometry::Color,
    surface::{EstimatedMetrics, TextMeasure},
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a factory may need to build an applet.
#[derive(Debug, Clone)]
pub struct AppletContext {
    /// Content height of the panel strip in pixels.
    pub height: u32,
    /// Font size used for applet labels.
    pub font_size: f32,
    /// Colour for applet labels.
    pub foreground: Color,
    pub metrics: Arc<dyn TextMeasure>,
}

impl Default for AppletContext {
    fn default() -> Self {
        Self {
            height: 24,
            font_size: 14.0,
            foreground: Color::INK,
            metrics: Arc::new(EstimatedMetrics::default()),
        }
    }
}

/// Human-facing description of an applet type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppletManifest {
    /// Reverse-DNS identifier used as the layout key.
    pub id: String,
    pub name: String,
    pub description: String,
}

impl AppletManifest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

pub type AppletFactory = Box<dyn Fn(&AppletContext) -> Result<Box<dyn Applet>>>;

struct Entry {
    manifest: AppletManifest,
    factory:  AppletFactory,
}

/// Maps applet identifiers to factories.
///
/// Populated once at startup by an explicit registration step and treated as
/// read-only afterwards.
#[derive(Default)]
pub struct AppletRegistry {
    entries: BTreeMap<String, Entry>,
}

impl AppletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory.  A second registration under the same id replaces
    /// the first.
    pub fn register<F>(&mut self, manifest: AppletManifest, factory: F)
    where
        F: Fn(&AppletContext) -> Result<Box<dyn Applet>> + 'static,
    {
        if self.entries.contains_key(&manifest.id) {
            tracing::warn!("Applet '{}' registered twice; keeping the last one", manifest.id);
        }
        self.entries.insert(
            manifest.id.clone(),
            Entry {
                manifest,
                factory: Box::new(factory),
            },
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn manifest(&self, id: &str) -> Option<&AppletManifest> {
        self.entries.get(id).map(|e| &e.manifest)
    }

    /// All manifests, sorted by display name.
    pub fn manifests(&self) -> Vec<&AppletManifest> {
        let mut all: Vec<_> = self.entries.values().map(|e| &e.manifest).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Build a fresh instance of the applet registered as `id`.
    pub fn instantiate(&self, id: &str, ctx: &AppletContext) -> Result<Box<dyn Applet>> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| PanelError::UnknownApplet(id.to_string()))?;
        (entry.factory)(ctx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AppletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
