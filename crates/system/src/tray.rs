//! StatusNotifierHost: tracks the items registered with the session's
//! StatusNotifierWatcher and reports the full item list on every change.

use crate::dbus::{StatusNotifierItemProxy, StatusNotifierWatcherProxy};
use futures::stream::{self, AbortHandle, BoxStream, SelectAll, StreamExt};
use panel_core::{state::TrayItem, PanelError, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::{proxy::CacheProperties, Connection};

/// Object path used by items that register a bare bus name.
const DEFAULT_ITEM_PATH: &str = "/StatusNotifierItem";

/// Start the host on a background task.  The receiver yields the complete,
/// registration-ordered item list after every change.
pub fn spawn_host() -> mpsc::Receiver<Vec<TrayItem>> {
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        if let Err(e) = serve(tx).await {
            warn!("StatusNotifier host stopped: {e}");
        }
    });

    rx
}

/// Cheap check that a session bus can be reached at all.
///
/// Used when constructing the tray applet so that a desktop without D-Bus
/// gets a typed failure instead of a silently empty tray.
pub fn session_bus_available() -> Result<()> {
    if std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some() {
        return Ok(());
    }
    let socket = std::env::var_os("XDG_RUNTIME_DIR").map(|dir| Path::new(&dir).join("bus"));
    if socket.is_some_and(|s| s.exists()) {
        return Ok(());
    }
    Err(PanelError::System("no D-Bus session bus".into()))
}

/// Ask an item to react to a click at absolute screen coordinates.  Items
/// that don't implement `Activate` get `ContextMenu` instead.
pub async fn activate(service: String, x: i32, y: i32) -> Result<()> {
    async {
        let con = Connection::session().await?;
        let item = item_proxy(&con, &service).await?;

        if let Err(e) = item.activate(x, y).await {
            debug!("Activate on {service} failed ({e}); trying ContextMenu");
            item.context_menu(x, y).await?;
        }
        Ok::<_, zbus::Error>(())
    }
    .await
    .map_err(dbus_error)
}

/// Register this connection as `org.freedesktop.StatusNotifierHost-<pid>-<n>`
/// with the watcher.
pub async fn register_host(con: &Connection) -> zbus::Result<StatusNotifierWatcherProxy<'static>> {
    use zbus::fdo::{RequestNameFlags, RequestNameReply};

    let pid = std::process::id();
    let mut n = 0;
    let name = loop {
        let name = format!("org.freedesktop.StatusNotifierHost-{pid}-{n}");
        let flags = RequestNameFlags::DoNotQueue.into();

        match con.request_name_with_flags(name.as_str(), flags).await? {
            RequestNameReply::PrimaryOwner => break name,
            RequestNameReply::Exists | RequestNameReply::AlreadyOwner => n += 1,
            RequestNameReply::InQueue => {
                return Err(zbus::Error::Failure(format!("queued for {name} despite DoNotQueue")))
            }
        }
    };

    let watcher = StatusNotifierWatcherProxy::new(con).await?;
    watcher.register_status_notifier_host(&name).await?;
    info!("Registered as {name}");

    Ok(watcher)
}

enum Change {
    Registered(String),
    Unregistered(String),
    Updated(String),
}

struct Tracked {
    item:    TrayItem,
    proxy:   StatusNotifierItemProxy<'static>,
    signals: AbortHandle,
}

async fn serve(tx: mpsc::Sender<Vec<TrayItem>>) -> zbus::Result<()> {
    let con = Connection::session().await?;
    let watcher = register_host(&con).await?;

    let mut changes: SelectAll<BoxStream<'static, Change>> = SelectAll::new();
    changes.push(
        watcher
            .receive_status_notifier_item_registered()
            .await?
            .filter_map(|sig| async move { Some(Change::Registered(sig.args().ok()?.service.to_string())) })
            .boxed(),
    );
    changes.push(
        watcher
            .receive_status_notifier_item_unregistered()
            .await?
            .filter_map(|sig| async move { Some(Change::Unregistered(sig.args().ok()?.service.to_string())) })
            .boxed(),
    );

    let mut tracked: Vec<Tracked> = Vec::new();
    for service in watcher.registered_status_notifier_items().await? {
        add(&con, &service, &mut tracked, &mut changes).await;
    }
    if tx.send(snapshot(&tracked)).await.is_err() {
        return Ok(());
    }

    while let Some(change) = changes.next().await {
        let dirty = match change {
            Change::Registered(service) => add(&con, &service, &mut tracked, &mut changes).await,
            Change::Unregistered(service) => remove(&service, &mut tracked),
            Change::Updated(service) => refresh(&service, &mut tracked).await,
        };

        if dirty && tx.send(snapshot(&tracked)).await.is_err() {
            break; // receiver dropped
        }
    }

    Ok(())
}

async fn add(
    con: &Connection,
    service: &str,
    tracked: &mut Vec<Tracked>,
    changes: &mut SelectAll<BoxStream<'static, Change>>,
) -> bool {
    if tracked.iter().any(|t| t.item.service == service) {
        warn!("Duplicate registration of {service}");
        return false;
    }

    match track(con, service).await {
        Ok((entry, signals)) => {
            info!("Tray item added: {service}");
            tracked.push(entry);
            changes.push(signals);
            true
        }
        Err(e) => {
            warn!("Could not create StatusNotifierItem from {service}: {e}");
            false
        }
    }
}

fn remove(service: &str, tracked: &mut Vec<Tracked>) -> bool {
    let Some(index) = tracked.iter().position(|t| t.item.service == service) else {
        return false;
    };
    let gone = tracked.remove(index);
    gone.signals.abort();
    info!("Tray item removed: {service}");
    true
}

async fn refresh(service: &str, tracked: &mut [Tracked]) -> bool {
    let Some(entry) = tracked.iter_mut().find(|t| t.item.service == service) else {
        return false;
    };
    let item = read_item(service, &entry.proxy).await;
    if item == entry.item {
        return false;
    }
    debug!("Tray item changed: {service}");
    entry.item = item;
    true
}

async fn track(con: &Connection, service: &str) -> zbus::Result<(Tracked, BoxStream<'static, Change>)> {
    let proxy = item_proxy(con, service).await?;
    let item = read_item(service, &proxy).await;

    let updates = stream::select_all([
        proxy.receive_new_icon().await?.map(|_| ()).boxed(),
        proxy.receive_new_attention_icon().await?.map(|_| ()).boxed(),
        proxy.receive_new_status().await?.map(|_| ()).boxed(),
        proxy.receive_new_title().await?.map(|_| ()).boxed(),
    ]);
    let owner = service.to_string();
    let (updates, signals) = stream::abortable(updates.map(move |()| Change::Updated(owner.clone())));

    Ok((Tracked { item, proxy, signals }, updates.boxed()))
}

async fn item_proxy(con: &Connection, service: &str) -> zbus::Result<StatusNotifierItemProxy<'static>> {
    let (destination, path) = split_address(service);

    // Items announce changes through New* signals, not PropertiesChanged,
    // so cached property values would go stale.
    StatusNotifierItemProxy::builder(con)
        .destination(destination)?
        .path(path)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
}

async fn read_item(service: &str, proxy: &StatusNotifierItemProxy<'_>) -> TrayItem {
    TrayItem {
        service: service.to_string(),
        title: proxy.title().await.unwrap_or_default(),
        status: proxy
            .status()
            .await
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        icon_name: proxy.icon_name().await.unwrap_or_default(),
        attention_icon_name: proxy.attention_icon_name().await.unwrap_or_default(),
        icon_theme_path: proxy.icon_theme_path().await.unwrap_or_default(),
    }
}

fn snapshot(tracked: &[Tracked]) -> Vec<TrayItem> {
    tracked.iter().map(|t| t.item.clone()).collect()
}

/// Split a watcher entry (`{bus}{object_path}`, e.g.
/// `:1.50/org/ayatana/NotificationItem/nm_applet`) into bus name and path.
/// Entries without a path use the conventional `/StatusNotifierItem`.
pub fn split_address(service: &str) -> (String, String) {
    match service.find('/') {
        Some(index) => (service[..index].to_string(), service[index..].to_string()),
        None => (service.to_string(), DEFAULT_ITEM_PATH.to_string()),
    }
}

fn dbus_error(e: zbus::Error) -> PanelError {
    PanelError::Ipc(format!("D-Bus: {e}"))
}
