//! Popup menus drawn by the host below the strip.
//!
//! The layer surface grows downwards while a popup is open; the popup is laid
//! out in that extra space, horizontally centred on its anchor.

use crate::Message;
use iced::widget::{button, column, container, image, row, scrollable, svg, text, Column, Space};
use iced::{Alignment, Border, Element, Length};
use panel_core::{Icon, MenuEntry, PopupMenu};
use panel_renderer::Dispatch;
use panel_theme::{Theme, ToIced};

pub const WIDTH: u32 = 240;
const TITLE_HEIGHT: u32 = 28;
const ENTRY_HEIGHT: u32 = 26;
const PADDING: u32 = 6;
const ICON_SIZE: f32 = 18.0;
const ICON_SPACING: f32 = 6.0;
/// Taller menus scroll.
const MAX_HEIGHT: u32 = 480;

/// Who asked for the open popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The panel's own "Add applet" menu.
    Host,
    Applet,
}

/// Whether a strip click that dispatched as `dispatch` closes a popup opened
/// by `owner`.  Applets toggle their own popups; the host menu closes on any
/// strip click.
pub fn dismissed_by(owner: Owner, dispatch: &Dispatch) -> bool {
    match owner {
        Owner::Host => true,
        Owner::Applet => !matches!(dispatch, Dispatch::Applet { .. }),
    }
}

/// Total height of `menu`, padding included.
pub fn height(menu: &PopupMenu) -> u32 {
    let content = TITLE_HEIGHT + menu.entries.len().max(1) as u32 * ENTRY_HEIGHT;
    (content + 2 * PADDING).min(MAX_HEIGHT)
}

/// Left edge of the popup: centred on the anchor, kept on screen.
pub fn left(menu: &PopupMenu, panel_width: u32) -> u32 {
    let ideal = menu.anchor.x - WIDTH as i32 / 2;
    ideal.clamp(0, panel_width.saturating_sub(WIDTH) as i32) as u32
}

pub fn view<'a>(menu: &'a PopupMenu, theme: &Theme, panel_width: u32) -> Element<'a, Message> {
    // labels line up as soon as one entry has an icon
    let with_icons = menu.entries.iter().any(|entry| entry.icon.is_some());

    let entries: Vec<Element<'a, Message>> = if menu.entries.is_empty() {
        vec![text("(empty)").size(theme.font_size).into()]
    } else {
        menu.entries
            .iter()
            .map(|entry| {
                button(label(entry, with_icons, theme.font_size))
                    .on_press(Message::MenuChosen(entry.action.clone()))
                    .width(Length::Fill)
                    .height(Length::Fixed(ENTRY_HEIGHT as f32))
                    .style(button::text)
                    .into()
            })
            .collect()
    };

    let title = text(&menu.title).size(theme.font_size);
    let body = column![
        container(title).height(Length::Fixed(TITLE_HEIGHT as f32)).align_y(Alignment::Center),
        scrollable(Column::with_children(entries)),
    ];

    let background = theme.popup_background.to_iced();
    let border = theme.border.to_iced();
    let card = container(body)
        .width(Length::Fixed(WIDTH as f32))
        .height(Length::Fixed(height(menu) as f32))
        .padding(PADDING as u16)
        .style(move |_: &iced::Theme| container::Style {
            background: Some(background.into()),
            border: Border {
                color: border,
                width: 1.0,
                radius: 4.0.into(),
            },
            ..container::Style::default()
        });

    row![
        Space::new().width(Length::Fixed(left(menu, panel_width) as f32)),
        card,
        Space::new().width(Length::Fill),
    ]
    .into()
}

fn label<'a>(entry: &'a MenuEntry, with_icons: bool, font_size: f32) -> Element<'a, Message> {
    let name = text(&entry.label).size(font_size);
    if !with_icons {
        return name.into();
    }

    let picture: Element<'a, Message> = match &entry.icon {
        Some(Icon::File(path)) if path.extension().is_some_and(|ext| ext == "svg") => {
            svg(svg::Handle::from_path(path)).width(ICON_SIZE).height(ICON_SIZE).into()
        }
        Some(Icon::File(path)) => image(image::Handle::from_path(path)).width(ICON_SIZE).height(ICON_SIZE).into(),
        Some(Icon::Pixels(pixmap)) => {
            let handle = image::Handle::from_rgba(pixmap.width, pixmap.height, pixmap.rgba.to_vec());
            image(handle).width(ICON_SIZE).height(ICON_SIZE).into()
        }
        None => Space::new().width(ICON_SIZE).into(),
    };

    row![picture, name].spacing(ICON_SPACING).align_y(Alignment::Center).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::{MenuAction, MenuEntry, Position};

    fn menu(anchor_x: i32, entries: usize) -> PopupMenu {
        PopupMenu {
            anchor: Position::new(anchor_x, 24),
            title: "Network".into(),
            entries: (0..entries)
                .map(|i| MenuEntry {
                    label: format!("app {i}"),
                    icon: None,
                    action: MenuAction::Launch(format!("app{i}")),
                })
                .collect(),
        }
    }

    #[test]
    fn host_menu_closes_on_any_strip_click() {
        let on_applet = Dispatch::Applet { id: "org.cream.simplepanel.MenuApplet".into(), local: Position::new(3, 3) };
        assert!(dismissed_by(Owner::Host, &on_applet));
        assert!(dismissed_by(Owner::Host, &Dispatch::Ignored));
        assert!(dismissed_by(Owner::Host, &Dispatch::ContextMenu { at: Position::new(900, 12) }));
    }

    #[test]
    fn applet_popups_are_left_to_their_applet() {
        let on_applet = Dispatch::Applet { id: "org.cream.simplepanel.MenuApplet".into(), local: Position::new(3, 3) };
        assert!(!dismissed_by(Owner::Applet, &on_applet));
        assert!(dismissed_by(Owner::Applet, &Dispatch::Ignored));
        assert!(dismissed_by(Owner::Applet, &Dispatch::ContextMenu { at: Position::new(900, 12) }));
    }

    #[test]
    fn centred_on_anchor() {
        assert_eq!(left(&menu(500, 1), 1440), 380);
    }

    #[test]
    fn kept_on_screen() {
        assert_eq!(left(&menu(16, 1), 1440), 0);
        assert_eq!(left(&menu(1430, 1), 1440), 1200);
        assert_eq!(left(&menu(100, 1), 200), 0, "narrower panel than popup");
    }

    #[test]
    fn height_grows_then_caps() {
        assert_eq!(height(&menu(0, 0)), 28 + 26 + 12);
        assert_eq!(height(&menu(0, 3)), 28 + 3 * 26 + 12);
        assert_eq!(height(&menu(0, 100)), MAX_HEIGHT);
    }
}
