//! Launching desktop applications.

use panel_core::{PanelError, Result};
use regex::Regex;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info};

/// Desktop-entry field codes the panel has no values for.
static FIELD_CODES: LazyLock<Regex> = LazyLock::new(|| Regex::new("%[ifFuUck]").unwrap());

/// Remove `%i %f %F %u %U %c %k` from an `Exec=` line.
pub fn strip_field_codes(exec: &str) -> String {
    let stripped = FIELD_CODES.replace_all(exec, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run `command_line` through `sh -c`, detached from the panel.
///
/// The child is reaped on a background task so it never lingers as a zombie.
pub async fn launch(command_line: String) -> Result<()> {
    let command_line = command_line.trim();
    if command_line.is_empty() {
        return Err(PanelError::System("refusing to launch an empty command".into()));
    }

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| PanelError::System(format!("spawn '{command_line}': {e}")))?;

    info!("Launched '{command_line}' (pid {:?})", child.id());

    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => debug!("Child exited: {status}"),
            Err(e) => debug!("Lost track of child: {e}"),
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_codes_are_removed() {
        assert_eq!(strip_field_codes("firefox %u"), "firefox");
        assert_eq!(strip_field_codes("gimp-2.10 %U"), "gimp-2.10");
        assert_eq!(strip_field_codes("app --icon %i --caption %c %k %f %F"), "app --icon --caption");
    }

    #[test]
    fn other_percent_sequences_survive() {
        assert_eq!(strip_field_codes("printf 100%%"), "printf 100%%");
        assert_eq!(strip_field_codes("date +%Y"), "date +%Y");
    }

    #[tokio::test]
    async fn empty_commands_are_refused() {
        assert!(matches!(launch("   ".into()).await, Err(PanelError::System(_))));
    }

    #[tokio::test]
    async fn launches_through_the_shell() {
        assert!(launch("true".into()).await.is_ok());
    }
}
