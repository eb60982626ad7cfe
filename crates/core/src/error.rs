use thiserror::Error;

/// Top-level error type used across the entire panel.
///
/// None of these are fatal to the panel process: the host logs them and keeps
/// running, if necessary with fewer applets (or none at all).
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("system error: {0}")]
    System(String),

    #[error("wayland error: {0}")]
    Wayland(String),

    /// An icon name or theme resource could not be resolved.
    #[error("resource lookup failed: {0}")]
    ResourceLookup(String),

    /// An applet was found without allocation or position during a pass.
    #[error("layout inconsistency: {0}")]
    LayoutInconsistency(String),

    /// A collaborator (tray host, indicator library, …) failed to initialise
    /// while constructing an applet.
    #[error("applet '{applet}' could not initialise: {reason}")]
    ExternalBridge { applet: String, reason: String },

    #[error("no applet registered as '{0}'")]
    UnknownApplet(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PanelError {
    pub fn bridge(applet: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExternalBridge {
            applet: applet.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = PanelError> = std::result::Result<T, E>;
