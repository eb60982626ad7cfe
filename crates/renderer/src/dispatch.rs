//! Hit-testing pointer coordinates against the laid-out applets.

use crate::layout::LayoutModel;
use panel_core::{Applet, MouseButton, Position};

/// Where a pointer release ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Delivered to an applet at applet-local coordinates.
    Applet { id: String, local: Position },
    /// Secondary click over empty panel space: show the panel's own menu.
    ContextMenu { at: Position },
    /// Nothing under the pointer, nothing to do.
    Ignored,
}

impl LayoutModel {
    /// First applet (in stored group/object order) whose rectangle contains
    /// the point.  Bounds are inclusive on all four edges.  Applets without
    /// an allocation or position are skipped.
    pub fn applet_at(&self, px: i32, py: i32) -> Option<&dyn Applet> {
        self.applets()
            .find(|a| a.state().rect().is_some_and(|r| r.contains(px, py)))
    }

    pub fn applet_at_mut(&mut self, px: i32, py: i32) -> Option<&mut dyn Applet> {
        self.applets_mut()
            .find(|a| a.state().rect().is_some_and(|r| r.contains(px, py)))
    }
}

/// Find the applet under `(px, py)` and deliver the click in its local
/// coordinates.  Only one applet ever receives the event.
pub fn locate_and_dispatch(
    model: &mut LayoutModel,
    px: i32,
    py: i32,
    button: MouseButton,
) -> Dispatch {
    if let Some(applet) = model.applet_at_mut(px, py) {
        let origin = applet.get_position().unwrap_or(Position::ORIGIN);
        let local = Position::new(px - origin.x, py - origin.y);

        tracing::debug!("Click at ({px}, {py}) → {} ({}, {})", applet.id(), local.x, local.y);
        applet.handle_click(local.x, local.y);

        return Dispatch::Applet {
            id: applet.id().to_string(),
            local,
        };
    }

    match button {
        MouseButton::Secondary => Dispatch::ContextMenu {
            at: Position::new(px, py),
        },
        _ => Dispatch::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{
        tests::{applet, group, unsized_applet},
        Orientation,
    };

    fn right_pair() -> LayoutModel {
        let mut model = LayoutModel {
            groups: vec![group(Orientation::Right, 5, vec![applet("a", 22), applet("b", 30)])],
        };
        model.relayout(1440);
        model
    }

    #[test]
    fn click_reaches_applet_in_local_coordinates() {
        let mut model = right_pair();
        let outcome = locate_and_dispatch(&mut model, 1420, 10, MouseButton::Primary);
        assert_eq!(
            outcome,
            Dispatch::Applet {
                id: "a".into(),
                local: Position::new(7, 10)
            }
        );
    }

    #[test]
    fn right_and_bottom_edges_are_inside() {
        let model = right_pair();
        // a spans x 1413..=1435, y 0..=24
        assert_eq!(model.applet_at(1435, 24).map(|a| a.id()), Some("a"));
        assert_eq!(model.applet_at(1436, 10).map(|a| a.id()), None);
        assert_eq!(model.applet_at(1420, 25).map(|a| a.id()), None);
    }

    #[test]
    fn shared_edge_goes_to_first_in_stored_order() {
        let model = right_pair();
        // b's right edge (1413) is a's left edge
        assert_eq!(model.applet_at(1413, 5).map(|a| a.id()), Some("a"));
    }

    #[test]
    fn empty_space_secondary_click_opens_context_menu() {
        let mut model = right_pair();
        assert_eq!(
            locate_and_dispatch(&mut model, 100, 10, MouseButton::Secondary),
            Dispatch::ContextMenu {
                at: Position::new(100, 10)
            }
        );
        assert_eq!(
            locate_and_dispatch(&mut model, 100, 10, MouseButton::Primary),
            Dispatch::Ignored
        );
    }

    #[test]
    fn unsized_applet_never_receives_clicks() {
        let mut model = LayoutModel {
            groups: vec![group(Orientation::Left, 0, vec![unsized_applet("pending"), applet("b", 10)])],
        };
        model.relayout(100);
        assert_eq!(
            locate_and_dispatch(&mut model, 0, 0, MouseButton::Primary),
            Dispatch::Applet {
                id: "b".into(),
                local: Position::new(0, 0)
            }
        );
    }

    #[test]
    fn empty_layout_ignores_everything() {
        let mut model = LayoutModel::new();
        assert_eq!(locate_and_dispatch(&mut model, 3, 3, MouseButton::Primary), Dispatch::Ignored);
    }
}
