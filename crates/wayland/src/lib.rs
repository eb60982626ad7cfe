//! Wayland layer-shell surface for `simple-panel`.
//!
//! Owns the Iced application loop and wires the toolkit-neutral [`Panel`] to
//! its background collaborators:
//! - StatusNotifier tray host (D-Bus)
//! - desktop-entry scan
//! - Hyprland IPC (window state for the background fade)
//! - config file watcher (live reload on change)
//! - the periodic tick (window-state poll, indicator pump)

mod canvas;
mod metrics;
mod popup;
mod surface;

use crate::canvas::{Strip, StripCaches};
use crate::metrics::ShapedMetrics;
use crate::popup::Owner;
use futures::channel::mpsc::Sender;
use iced::{
    mouse,
    widget::{canvas as canvas_widget, column, mouse_area},
    window, Element, Event, Font, Length, Point, Subscription, Task,
};
use iced_layershell::{
    build_pattern::application,
    reexport::{Anchor, Layer},
    settings::{LayerShellSettings, Settings},
    to_layer_message,
};
use panel_applets::builtin_registry;
use panel_config::{default_path, load as load_config, save_layout, ConfigWatcher, PanelConfig, Position};
use panel_core::{
    state::{DesktopApp, TrayItem},
    AppletAction, AppletContext, AppletMessage, MenuAction, MouseButton, PopupMenu,
};
use panel_ipc::{fetch_active_workspace, HyprlandEvent, HyprlandIpc};
use panel_renderer::{Dispatch, Panel};
use panel_theme::{Fade, Theme, ToIced};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Redraw rate while the background fade is running.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// ── Entry point ───────────────────────────────────────────────────────────────

/// Start the Wayland panel.  Never returns under normal operation.
pub fn run() -> iced_layershell::Result {
    let config = load_config(default_path()).unwrap_or_default();
    let height = config.global.height;
    let anchor = position_to_anchor(config.global.position);
    let exclusive_zone = if config.global.exclusive_zone {
        height as i32
    } else {
        0
    };

    application(Shell::new, Shell::namespace, Shell::update, Shell::view)
        .subscription(Shell::subscription)
        .style(Shell::style)
        .settings(Settings {
            layer_settings: LayerShellSettings {
                // width=0 + L|R anchor = full-width stretch; the shadow hangs
                // below the exclusive zone.
                size: Some((0, height + config.global.shadow_height)),
                exclusive_zone,
                anchor,
                layer: Layer::Top,
                ..Default::default()
            },
            ..Default::default()
        })
        .run()
}

// ── Message ───────────────────────────────────────────────────────────────────

/// Top-level application messages.
///
/// `#[to_layer_message]` injects layer-shell control variants (AnchorChange,
/// SizeChange, etc.).  Those are handled by the backend in 0.15 and never
/// reach `update()`.
#[to_layer_message]
#[derive(Debug, Clone)]
pub enum Message {
    /// Full current list of StatusNotifierItems.
    TrayItems(Vec<TrayItem>),
    /// Desktop-entry scan finished.
    DesktopApps(Vec<DesktopApp>),
    /// Something happened on the compositor that may change window state.
    Compositor(HyprlandEvent),
    /// Result of a window-state poll: does the active workspace show a
    /// fullscreen or maximized window?
    WindowState(Result<bool, String>),
    ConfigReloaded,
    /// Periodic tick (window-state poll, indicator pump).
    Tick,
    /// Animation frame while the fade runs.
    Frame,
    /// The surface was resized.
    Resized(u32),
    CursorMoved(Point),
    Released(MouseButton),
    /// An entry of the open popup was chosen.
    MenuChosen(MenuAction),
    /// Click in the popup area outside any entry.
    DismissPopup,
}

// ── State ─────────────────────────────────────────────────────────────────────

struct Shell {
    panel:  Panel,
    config: PanelConfig,
    theme:  Theme,
    font:   Font,
    fade:   Fade,
    ipc:    Option<HyprlandIpc>,
    popup:  Option<(PopupMenu, Owner)>,
    cursor: Point,
    caches: StripCaches,
}

impl Shell {
    fn new() -> (Self, Task<Message>) {
        let config = load_config(default_path()).unwrap_or_default();
        let theme = Theme::from_config(&config.theme);
        // Built once; the name has to live for the whole process.
        let font = Font::with_name(Box::leak(config.theme.font.clone().into_boxed_str()));

        let ctx = AppletContext {
            height: config.global.height,
            font_size: theme.font_size,
            foreground: theme.foreground,
            metrics: Arc::new(ShapedMetrics::new(font)),
        };
        let mut panel = Panel::new(builtin_registry(&config), ctx, 0);
        panel.load(&config.layout);

        let ipc = HyprlandIpc::new()
            .map_err(|e| warn!("Hyprland IPC unavailable (not under Hyprland?): {e}"))
            .ok();

        let mut shell = Self {
            panel,
            font,
            config,
            theme,
            fade: Fade::default(),
            ipc,
            popup: None,
            cursor: Point::ORIGIN,
            caches: StripCaches::default(),
        };
        shell.refresh();

        let initial_poll = shell.poll_window_state();
        (shell, initial_poll)
    }

    fn namespace() -> String {
        String::from("simple-panel")
    }

    // ── Update ────────────────────────────────────────────────────────────────

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TrayItems(items) => self.deliver(AppletMessage::TrayItems(items)),
            Message::DesktopApps(apps) => self.deliver(AppletMessage::DesktopApps(apps)),
            Message::Tick => {
                let poll = self.poll_window_state();
                Task::batch([self.deliver(AppletMessage::Tick), poll])
            }
            Message::Compositor(event) => {
                debug!("Hyprland event: {event:?}");
                if event.affects_fullscreen() {
                    self.poll_window_state()
                } else {
                    Task::none()
                }
            }
            Message::WindowState(Ok(maximized)) => {
                let target = if maximized { 1.0 } else { 0.0 };
                let duration = Duration::from_millis(self.config.global.fade_duration_ms);
                if self.fade.retarget(target, duration, Instant::now()) {
                    debug!("Background fade → {target}");
                    self.caches.clear_chrome();
                }
                Task::none()
            }
            Message::WindowState(Err(e)) => {
                debug!("Window state poll failed: {e}");
                Task::none()
            }
            Message::Frame => {
                self.caches.clear_chrome();
                Task::none()
            }
            Message::Resized(width) => {
                self.panel.set_width(width);
                self.refresh();
                Task::none()
            }
            Message::CursorMoved(point) => {
                self.cursor = point;
                Task::none()
            }
            Message::Released(button) => self.click(button),
            Message::MenuChosen(action) => {
                let close = self.close_popup();
                Task::batch([close, self.choose(action)])
            }
            Message::DismissPopup => self.close_popup(),
            Message::ConfigReloaded => {
                self.reload();
                Task::none()
            }
            // Layer-shell injected variants handled by backend in iced-layershell 0.15.
            _ => Task::none(),
        }
    }

    /// Forward collaborator data to every applet, then carry out whatever
    /// they asked for.
    fn deliver(&mut self, message: AppletMessage) -> Task<Message> {
        self.panel.broadcast(&message);
        self.settle()
    }

    /// Drain applet notifications: relayout, invalidate damaged geometry and
    /// turn requested actions into tasks.
    fn settle(&mut self) -> Task<Message> {
        let actions = self.panel.pump();
        self.refresh();
        Task::batch(actions.into_iter().map(|action| self.perform(action)).collect::<Vec<_>>())
    }

    fn refresh(&mut self) {
        let damage = self.panel.take_damage();
        if !damage.is_empty() {
            self.caches.apply(&self.panel, &damage);
        }
    }

    fn click(&mut self, button: MouseButton) -> Task<Message> {
        let (x, y) = (self.cursor.x.round() as i32, self.cursor.y.round() as i32);
        let dispatch = self.panel.click(x, y, button);

        let owner = self.popup.as_ref().map(|(_, owner)| *owner);
        let mut tasks = Vec::new();
        if owner.is_some_and(|owner| popup::dismissed_by(owner, &dispatch)) {
            tasks.push(self.dismiss());
        }

        match dispatch {
            Dispatch::Applet { .. } => tasks.push(self.settle()),
            // a second right click only closes the menu
            Dispatch::ContextMenu { .. } if owner == Some(Owner::Host) => {}
            Dispatch::ContextMenu { at } => {
                let menu = self.panel.context_menu(at);
                self.popup = Some((menu, Owner::Host));
            }
            Dispatch::Ignored => {}
        }

        tasks.push(self.resize());
        Task::batch(tasks)
    }

    fn perform(&mut self, action: AppletAction) -> Task<Message> {
        match action {
            AppletAction::ActivateTrayItem { service, x, y } => Task::future(async move {
                if let Err(e) = panel_system::tray::activate(service.clone(), x, y).await {
                    warn!("Activating {service} failed: {e}");
                }
            })
            .discard(),
            AppletAction::Launch(command) => spawn(command),
            AppletAction::Popup(menu) => self.show_popup(menu, Owner::Applet),
            AppletAction::ClosePopup => {
                self.popup = None;
                self.resize()
            }
        }
    }

    fn choose(&mut self, action: MenuAction) -> Task<Message> {
        match action {
            MenuAction::Launch(command) => spawn(command),
            MenuAction::AddApplet(id) => {
                if let Err(e) = self.panel.add_applet(&id) {
                    warn!("Cannot add applet '{id}': {e}");
                    return Task::none();
                }
                if let Err(e) = save_layout(default_path(), self.panel.snapshot_layout()) {
                    warn!("Could not save layout: {e}");
                }
                self.settle()
            }
        }
    }

    fn show_popup(&mut self, menu: PopupMenu, owner: Owner) -> Task<Message> {
        debug!("Popup '{}' with {} entries", menu.title, menu.entries.len());
        self.popup = Some((menu, owner));
        self.resize()
    }

    /// Close the popup on the host's initiative and tell the applets.
    fn close_popup(&mut self) -> Task<Message> {
        let notify = self.dismiss();
        Task::batch([notify, self.resize()])
    }

    /// Like [`Self::close_popup`], leaving the surface size to the caller.
    fn dismiss(&mut self) -> Task<Message> {
        if self.popup.take().is_none() {
            return Task::none();
        }
        self.deliver(AppletMessage::PopupClosed)
    }

    /// Grow or shrink the surface to fit the strip, its shadow and the open
    /// popup.
    fn resize(&self) -> Task<Message> {
        let strip = self.panel.height() + self.config.global.shadow_height;
        let height = strip + self.popup.as_ref().map_or(0, |(menu, _)| popup::height(menu));
        Task::done(Message::SizeChange((0, height)))
    }

    fn poll_window_state(&self) -> Task<Message> {
        let Some(ipc) = self.ipc.clone() else {
            return Task::none();
        };
        Task::perform(
            async move {
                fetch_active_workspace(&ipc)
                    .await
                    .map(|ws| ws.has_fullscreen)
                    .map_err(|e| e.to_string())
            },
            Message::WindowState,
        )
    }

    fn reload(&mut self) {
        let config = match load_config(default_path()) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return;
            }
        };
        info!("Config reloaded");

        self.theme = Theme::from_config(&config.theme);
        if config.layout != self.panel.snapshot_layout() {
            self.panel.load(&config.layout);
        }
        if config.global.height != self.config.global.height {
            warn!("Panel height changes take effect after a restart");
        }
        self.config = config;
        self.caches.clear_chrome();
        self.refresh();
    }

    // ── View ──────────────────────────────────────────────────────────────────

    fn view(&self) -> Element<'_, Message> {
        let strip_height = self.panel.height() + self.config.global.shadow_height;
        let level = self.fade.level_at(Instant::now());

        let strip = canvas_widget(Strip {
            panel:  &self.panel,
            caches: &self.caches,
            style:  self.theme.panel_style(level),
            font:   self.font,
        })
        .width(Length::Fill)
        .height(Length::Fixed(strip_height as f32));

        let strip = mouse_area(strip)
            .on_move(Message::CursorMoved)
            .on_release(Message::Released(MouseButton::Primary))
            .on_middle_release(Message::Released(MouseButton::Middle))
            .on_right_release(Message::Released(MouseButton::Secondary));

        match &self.popup {
            None => strip.into(),
            Some((menu, _)) => {
                let area = mouse_area(popup::view(menu, &self.theme, self.panel.width()))
                    .on_release(Message::DismissPopup);
                column![strip, area].into()
            }
        }
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    fn subscription(&self) -> Subscription<Message> {
        let tick = iced::time::every(Duration::from_millis(self.config.global.poll_interval_ms))
            .map(|_| Message::Tick);

        let mut subscriptions = vec![
            tick,
            iced::event::listen_with(window_event),
            Subscription::run(tray_stream),
            Subscription::run(desktop_stream),
            Subscription::run(ipc_stream),
            Subscription::run(config_stream),
        ];

        if self.fade.is_running(Instant::now()) {
            subscriptions.push(iced::time::every(FRAME_INTERVAL).map(|_| Message::Frame));
        }

        Subscription::batch(subscriptions)
    }

    // ── Style ─────────────────────────────────────────────────────────────────

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        // The canvas paints the strip itself; the shadow and popup area stay
        // see-through.
        iced::theme::Style {
            background_color: iced::Color::TRANSPARENT,
            text_color: self.theme.foreground.to_iced(),
        }
    }
}

// ── Subscription streams ──────────────────────────────────────────────────────
//
// Each free function acts as both the stream builder AND the unique identity
// key for `Subscription::run(fn_ptr)`.  Iced uses the function pointer address
// to deduplicate subscriptions across redraws.

/// Hosts the StatusNotifierWatcher and forwards the item list on every change.
fn tray_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(4, |mut sender: Sender<Message>| async move {
        let mut rx = panel_system::spawn_host();

        while let Some(items) = rx.recv().await {
            let _ = sender.try_send(Message::TrayItems(items));
        }

        // Host task exited (no session bus); stall rather than crash.
        park().await
    })
}

/// Enumerates desktop applications once at startup.
fn desktop_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(1, |mut sender: Sender<Message>| async move {
        let mut rx = panel_system::spawn_scan();

        if let Some(apps) = rx.recv().await {
            let _ = sender.try_send(Message::DesktopApps(apps));
        }

        park().await
    })
}

/// Streams Hyprland events that may change the active workspace's window
/// state (auto-reconnects on drop).
fn ipc_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(32, |mut sender: Sender<Message>| async move {
        let ipc = match HyprlandIpc::new() {
            Ok(c) => c,
            // Panel still runs without window state; `Shell::new` already
            // logged why.
            Err(_) => park().await,
        };

        let mut rx = ipc.spawn_listener();
        while let Some(event) = rx.recv().await {
            if event.affects_fullscreen() {
                let _ = sender.try_send(Message::Compositor(event));
            }
        }

        park().await
    })
}

/// Watches `~/.config/simple-panel/panel.toml` for writes and sends
/// `ConfigReloaded`.
fn config_stream() -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(1, |mut sender: Sender<Message>| async move {
        let (_watcher, mut rx) = ConfigWatcher::spawn(default_path());

        while rx.recv().await.is_some() {
            let _ = sender.try_send(Message::ConfigReloaded);
        }

        park().await
    })
}

async fn park() -> ! {
    loop {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn window_event(event: Event, _status: iced::event::Status, _id: window::Id) -> Option<Message> {
    match event {
        Event::Window(window::Event::Resized(size)) => Some(Message::Resized(size.width as u32)),
        Event::Mouse(mouse::Event::CursorLeft) => Some(Message::CursorMoved(Point::new(-1.0, -1.0))),
        _ => None,
    }
}

/// Run a command line in the background.
fn spawn(command: String) -> Task<Message> {
    Task::future(async move {
        if let Err(e) = panel_system::launch(command.clone()).await {
            warn!("Launching '{command}' failed: {e}");
        }
    })
    .discard()
}

fn position_to_anchor(pos: Position) -> Anchor {
    match pos {
        Position::Top    => Anchor::Top    | Anchor::Left | Anchor::Right,
        Position::Bottom => Anchor::Bottom | Anchor::Left | Anchor::Right,
    }
}
