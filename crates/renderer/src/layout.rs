//! The Layout Model and the Layout Engine.
//!
//! A model is an ordered list of groups anchored to the left or right panel
//! edge.  Each group packs its objects (applets and fixed spacers) outward
//! from its anchor; [`LayoutModel::relayout`] turns the model plus every
//! applet's current allocation into panel-space positions.

use panel_config::{GroupConfig, ObjectConfig};
use panel_core::{Applet, Rect};

pub use panel_config::Orientation;

/// One packed object.
pub enum LayoutObject {
    Applet { id: String, instance: Box<dyn Applet> },
    Spacer { size: u32 },
}

impl LayoutObject {
    pub fn applet(&self) -> Option<&dyn Applet> {
        match self {
            Self::Applet { instance, .. } => Some(instance.as_ref()),
            Self::Spacer { .. } => None,
        }
    }

    pub fn applet_mut(&mut self) -> Option<&mut dyn Applet> {
        match self {
            Self::Applet { instance, .. } => Some(instance.as_mut()),
            Self::Spacer { .. } => None,
        }
    }

    /// Width this object occupies in its group.  An applet that has not sized
    /// itself yet counts as a zero-width spacer.
    pub fn width(&self) -> u32 {
        match self {
            Self::Applet { instance, .. } => instance.get_allocation().map_or(0, |a| a.width),
            Self::Spacer { size } => *size,
        }
    }

    /// Persistence form (the live instance is dropped).
    pub fn to_config(&self) -> ObjectConfig {
        match self {
            Self::Applet { id, .. } => ObjectConfig::Applet { id: id.clone() },
            Self::Spacer { size } => ObjectConfig::Space { size: *size },
        }
    }
}

impl std::fmt::Debug for LayoutObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applet { id, instance } => f
                .debug_struct("Applet")
                .field("id", id)
                .field("allocation", &instance.get_allocation())
                .field("position", &instance.get_position())
                .finish(),
            Self::Spacer { size } => f.debug_struct("Spacer").field("size", size).finish(),
        }
    }
}

/// An ordered run of objects anchored to one panel edge.
#[derive(Debug)]
pub struct LayoutGroup {
    pub orientation:   Orientation,
    /// Distance of the group's first object from its anchoring edge.
    pub anchor_offset: i32,
    pub objects:       Vec<LayoutObject>,
    /// Applets named in the config that failed to load, with their index in
    /// the configured object list.  Kept so saving doesn't forget them.
    omitted: Vec<(usize, String)>,
}

impl LayoutGroup {
    pub fn new(orientation: Orientation, anchor_offset: i32) -> Self {
        Self {
            orientation,
            anchor_offset,
            objects: Vec::new(),
            omitted: Vec::new(),
        }
    }

    /// Assign positions to every sized applet in the group.
    ///
    /// Left groups advance the cursor rightward after placing each object.
    /// Right groups walk the objects in reverse stored order and move the
    /// cursor left *before* placing, so the first stored object ends up with
    /// its right edge on the anchor.  The stored order is never touched.
    fn relayout(&mut self, panel_width: u32) {
        match self.orientation {
            Orientation::Left => {
                let mut cursor = self.anchor_offset;
                for object in &mut self.objects {
                    let width = object.width() as i32;
                    place(object, cursor);
                    cursor += width;
                }
            }
            Orientation::Right => {
                let mut cursor = panel_width as i32 - self.anchor_offset;
                for object in self.objects.iter_mut().rev() {
                    cursor -= object.width() as i32;
                    place(object, cursor);
                }
            }
        }
    }

    pub fn applets(&self) -> impl Iterator<Item = &dyn Applet> + '_ {
        self.objects.iter().filter_map(LayoutObject::applet)
    }

    fn to_config(&self) -> GroupConfig {
        let mut objects: Vec<ObjectConfig> = self.objects.iter().map(LayoutObject::to_config).collect();
        for (index, id) in &self.omitted {
            let at = (*index).min(objects.len());
            objects.insert(at, ObjectConfig::Applet { id: id.clone() });
        }
        GroupConfig {
            orientation: self.orientation,
            position: self.anchor_offset,
            objects,
        }
    }
}

fn place(object: &mut LayoutObject, x: i32) {
    if let Some(applet) = object.applet_mut() {
        if applet.get_allocation().is_some() {
            applet.set_position(x, 0);
        }
    }
}

/// The live, declarative description of panel content.
#[derive(Debug, Default)]
pub struct LayoutModel {
    pub groups: Vec<LayoutGroup>,
}

impl LayoutModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a live model from its persisted form.  `make` instantiates an
    /// applet by id; `None` means it failed and is left out of the live model.
    pub fn from_config(
        groups: &[GroupConfig],
        mut make: impl FnMut(&str) -> Option<Box<dyn Applet>>,
    ) -> Self {
        let groups = groups
            .iter()
            .map(|cfg| {
                let mut group = LayoutGroup::new(cfg.orientation, cfg.position);
                for (index, object) in cfg.objects.iter().enumerate() {
                    match object {
                        ObjectConfig::Applet { id } => match make(id) {
                            Some(instance) => group.objects.push(LayoutObject::Applet {
                                id: id.clone(),
                                instance,
                            }),
                            None => group.omitted.push((index, id.clone())),
                        },
                        ObjectConfig::Space { size } => {
                            group.objects.push(LayoutObject::Spacer { size: *size })
                        }
                    }
                }
                group
            })
            .collect();

        Self { groups }
    }

    /// Persistence form: the same groups and objects, minus runtime instances.
    pub fn snapshot(&self) -> Vec<GroupConfig> {
        self.groups.iter().map(LayoutGroup::to_config).collect()
    }

    /// Recompute every applet's position from the model and the current
    /// allocations.  Overflow past the panel edges is not clamped.
    ///
    /// Taking `&mut self` makes a re-entrant relayout impossible.
    pub fn relayout(&mut self, panel_width: u32) {
        for group in &mut self.groups {
            group.relayout(panel_width);
        }

        for (a, b) in self.overlapping() {
            tracing::warn!("Applets '{a}' and '{b}' overlap after relayout");
        }
    }

    /// Every applet in stored group/object order.
    pub fn applets(&self) -> impl Iterator<Item = &dyn Applet> + '_ {
        self.groups.iter().flat_map(LayoutGroup::applets)
    }

    pub fn applets_mut(&mut self) -> impl Iterator<Item = &mut dyn Applet> + '_ {
        self.groups
            .iter_mut()
            .flat_map(|g| g.objects.iter_mut())
            .filter_map(LayoutObject::applet_mut)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.applets().any(|a| a.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.applets().next().is_none()
    }

    /// Pairs of applet ids whose rectangles overlap.
    pub fn overlapping(&self) -> Vec<(String, String)> {
        let placed: Vec<(&str, Rect)> = self
            .applets()
            .filter_map(|a| Some((a.id(), a.state().rect()?)))
            .filter(|(_, r)| !r.is_empty())
            .collect();

        let mut pairs = Vec::new();
        for (i, (a, ra)) in placed.iter().enumerate() {
            for (b, rb) in &placed[i + 1..] {
                if ra.intersects(rb) {
                    pairs.push((a.to_string(), b.to_string()));
                }
            }
        }
        pairs
    }
}
