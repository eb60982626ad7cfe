//! Enumerating installed desktop applications.

use freedesktop_desktop_entry::{default_paths, DesktopEntry, Iter};
use panel_core::state::DesktopApp;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Scan the XDG application directories on a blocking worker and deliver
/// the result once through the returned channel.
///
/// The scan touches hundreds of files, so it never runs on the host thread.
pub fn spawn_scan() -> mpsc::Receiver<Vec<DesktopApp>> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        match tokio::task::spawn_blocking(scan).await {
            Ok(apps) => {
                info!("Found {} desktop application(s)", apps.len());
                let _ = tx.send(apps).await;
            }
            Err(e) => warn!("Desktop entry scan failed: {e}"),
        }
    });

    rx
}

/// Every parseable desktop entry with an `Exec=` line.  When several data
/// directories ship the same id, the first (highest priority) one wins.
pub fn scan() -> Vec<DesktopApp> {
    let mut seen = HashSet::new();

    Iter::new(default_paths())
        .filter_map(|path| {
            let input = std::fs::read_to_string(&path).ok()?;
            parse_entry(&path, &input)
        })
        .filter(|app| seen.insert(app.id.clone()))
        .collect()
}

/// Decode one `.desktop` file.  Entries without an `Exec=` line are skipped.
pub fn parse_entry(path: &Path, input: &str) -> Option<DesktopApp> {
    let entry = match DesktopEntry::decode(path, input) {
        Ok(entry) => entry,
        Err(e) => {
            debug!("Skipping {}: {e}", path.display());
            return None;
        }
    };

    let exec = entry.exec()?.to_string();
    let name = entry
        .name(None)
        .map(|n| n.to_string())
        .unwrap_or_else(|| entry.appid.to_string());

    Some(DesktopApp {
        id: entry.appid.to_string(),
        name,
        exec,
        icon: entry.icon().map(str::to_string),
        categories: split_categories(entry.categories().unwrap_or_default()),
        no_display: entry.no_display(),
    })
}

/// `"GTK;Network;WebBrowser;"` → `["GTK", "Network", "WebBrowser"]`.
pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
[Desktop Entry]
Type=Application
Name=Firefox
Exec=firefox %u
Icon=firefox
Categories=GTK;Network;WebBrowser;
";

    #[test]
    fn categories_are_split_and_trimmed() {
        assert_eq!(split_categories("GTK;Network; WebBrowser;"), vec!["GTK", "Network", "WebBrowser"]);
        assert!(split_categories("").is_empty());
    }

    #[test]
    fn parses_a_typical_entry() {
        let path = Path::new("/usr/share/applications/firefox.desktop");
        let app = parse_entry(path, FIREFOX).unwrap();

        assert_eq!(app.id, "firefox");
        assert_eq!(app.name, "Firefox");
        assert_eq!(app.exec, "firefox %u");
        assert_eq!(app.icon.as_deref(), Some("firefox"));
        assert_eq!(app.categories, vec!["GTK", "Network", "WebBrowser"]);
        assert!(!app.no_display);
    }

    #[test]
    fn entries_without_exec_are_skipped() {
        let input = "[Desktop Entry]\nType=Link\nName=Docs\nURL=https://example.org\n";
        assert_eq!(parse_entry(Path::new("/tmp/docs.desktop"), input), None);
    }

    #[test]
    fn no_display_is_carried_through() {
        let input = format!("{FIREFOX}NoDisplay=true\n");
        let app = parse_entry(Path::new("/tmp/firefox.desktop"), &input).unwrap();
        assert!(app.no_display);
    }
}
