use crate::events::{parse_event, ActiveWorkspace, HyprlandEvent};
use panel_core::{PanelError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Hyprland IPC client.
///
/// Streams typed [`HyprlandEvent`]s from the event socket and answers
/// one-shot queries over the command socket.
#[derive(Debug, Clone)]
pub struct HyprlandIpc {
    /// `.socket2.sock`, the event stream.
    event_socket: PathBuf,
    /// `.socket.sock`, request/response.
    cmd_socket: PathBuf,
}

impl HyprlandIpc {
    /// Discover the sockets from `$HYPRLAND_INSTANCE_SIGNATURE`.
    pub fn new() -> Result<Self> {
        let sig = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
            .map_err(|_| PanelError::Ipc("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;

        let runtime_dir =
            std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/run/user/1000".to_string());

        Ok(Self::with_base(Path::new(&runtime_dir).join("hypr").join(sig)))
    }

    /// Client for the sockets inside `base`.
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            event_socket: base.join(".socket2.sock"),
            cmd_socket:   base.join(".socket.sock"),
        }
    }

    pub fn event_socket(&self) -> &Path {
        &self.event_socket
    }

    /// Forward parsed events on the returned channel, reconnecting whenever
    /// the socket drops.  Stops once the receiver is gone.
    pub fn spawn_listener(&self) -> mpsc::Receiver<HyprlandEvent> {
        let (tx, rx) = mpsc::channel(32);
        let path = self.event_socket.clone();

        tokio::spawn(async move {
            loop {
                match UnixStream::connect(&path).await {
                    Ok(stream) => {
                        info!("Connected to Hyprland event socket");
                        let mut lines = BufReader::new(stream).lines();

                        while let Ok(Some(line)) = lines.next_line().await {
                            if tx.send(parse_event(&line)).await.is_err() {
                                return;
                            }
                        }

                        warn!("Hyprland IPC connection lost; reconnecting in 2s");
                    }
                    Err(e) => error!("Cannot connect to Hyprland IPC: {e}; retrying in 2s"),
                }

                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });

        rx
    }

    /// Send one command and return the raw response.
    pub async fn command(&self, cmd: &str) -> Result<String> {
        let mut stream = UnixStream::connect(&self.cmd_socket)
            .await
            .map_err(|e| PanelError::Ipc(format!("connect: {e}")))?;

        stream
            .write_all(cmd.as_bytes())
            .await
            .map_err(|e| PanelError::Ipc(format!("write: {e}")))?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .map_err(|e| PanelError::Ipc(format!("read: {e}")))?;

        debug!("hyprctl {cmd} → {} bytes", response.len());
        Ok(response)
    }
}

/// The focused workspace, including whether it shows a fullscreen or
/// maximized window.
pub async fn fetch_active_workspace(ipc: &HyprlandIpc) -> Result<ActiveWorkspace> {
    let raw = ipc.command("j/activeworkspace").await?;
    serde_json::from_str(&raw).map_err(|e| PanelError::Ipc(format!("parse activeworkspace: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("panel-ipc-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn queries_active_workspace() {
        let dir = scratch("query");
        let ipc = HyprlandIpc::with_base(&dir);
        let listener = UnixListener::bind(dir.join(".socket.sock")).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"j/activeworkspace");
            stream
                .write_all(br#"{"id":4,"name":"web","windows":2,"hasfullscreen":true}"#)
                .await
                .unwrap();
        });

        let ws = fetch_active_workspace(&ipc).await.unwrap();
        assert_eq!(ws.name, "web");
        assert!(ws.has_fullscreen);
    }

    #[tokio::test]
    async fn listener_parses_lines() {
        let dir = scratch("events");
        let ipc = HyprlandIpc::with_base(&dir);
        let listener = UnixListener::bind(ipc.event_socket()).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"fullscreen>>1\nworkspacev2>>2,two\n").await.unwrap();
        });

        let mut rx = ipc.spawn_listener();
        assert_eq!(rx.recv().await, Some(HyprlandEvent::Fullscreen(true)));
        assert!(matches!(rx.recv().await, Some(HyprlandEvent::Workspace(_))));
    }

    #[tokio::test]
    async fn missing_socket_is_an_ipc_error() {
        let ipc = HyprlandIpc::with_base(scratch("missing"));
        assert!(matches!(ipc.command("j/version").await, Err(PanelError::Ipc(_))));
    }
}
