//! simple-panel: a desktop panel that hosts applets in a single strip.
//!
//! Run with:  `RUST_LOG=info simple-panel`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("simple-panel v{} starting", env!("CARGO_PKG_VERSION"));

    panel_wayland::run().map_err(Into::into)
}
