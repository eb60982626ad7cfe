use crate::{indicator, launcher, tray, IndicatorApplet, LauncherApplet, TrayApplet};
use panel_config::PanelConfig;
use panel_core::{Applet, AppletManifest, AppletRegistry};

/// Registry holding every applet that ships with the panel.
pub fn builtin_registry(config: &PanelConfig) -> AppletRegistry {
    let mut registry = AppletRegistry::new();

    registry.register(
        AppletManifest::new(
            launcher::ID,
            "Application Menu",
            "Browse installed applications by category",
        ),
        |ctx| Ok(Box::new(LauncherApplet::new(ctx)?) as Box<dyn Applet>),
    );

    registry.register(
        AppletManifest::new(
            tray::ID,
            "Application Indicators",
            "Status icons of running applications",
        ),
        |ctx| Ok(Box::new(TrayApplet::new(ctx)?) as Box<dyn Applet>),
    );

    let indicators = config.indicator.clone();
    registry.register(
        AppletManifest::new(
            indicator::ID,
            "Indicators",
            "Network, sound, clock and session indicators",
        ),
        move |ctx| Ok(Box::new(IndicatorApplet::new(ctx, &indicators)?) as Box<dyn Applet>),
    );

    registry
}
