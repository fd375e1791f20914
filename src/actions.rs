use crate::models::ItemAction;
use crate::utils;
use std::process::{Command, Stdio};

const URL_OPENER: &str = "xdg-open";

/// Carries out the actions the host hands back when the user picks an item.
/// Script and browser runs are fire-and-forget.
pub struct ActionExecutor {
    opener: String,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(URL_OPENER)
    }
}

impl ActionExecutor {
    pub fn new(opener: &str) -> Self {
        Self {
            opener: opener.to_string(),
        }
    }

    pub fn execute(&self, action: &ItemAction) -> Result<(), String> {
        match action {
            ItemAction::RunScript {
                script,
                verb,
                app_id,
                name,
            } => {
                utils::validate_app_id(app_id)?;
                log::info!("Running {:?} {} {} ({})", script, verb.as_str(), app_id, name);
                Command::new(script)
                    .args([verb.as_str(), app_id.as_str(), name.as_str()])
                    .stdin(Stdio::null())
                    .spawn()
                    .map(|_| ())
                    .map_err(|e| format!("Failed to start {:?}: {}", script, e))
            }
            ItemAction::OpenUrl(url) => {
                log::info!("Opening {}", url);
                Command::new(&self.opener)
                    .arg(url)
                    .stdin(Stdio::null())
                    .spawn()
                    .map(|_| ())
                    .map_err(|e| format!("Failed to open {}: {}", url, e))
            }
            // Window and list handling belong to the host.
            ItemAction::HideWindow | ItemAction::RenderResultList(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultItem, ScriptVerb};
    use std::path::PathBuf;

    #[test]
    fn test_host_actions_are_noops() {
        let exec = ActionExecutor::default();
        assert!(exec.execute(&ItemAction::HideWindow).is_ok());
        assert!(exec
            .execute(&ItemAction::RenderResultList(vec![ResultItem::searching()]))
            .is_ok());
    }

    #[test]
    fn test_missing_script_reports_error() {
        let exec = ActionExecutor::default();
        let result = exec.execute(&ItemAction::RunScript {
            script: PathBuf::from("/nonexistent/flatpak-helper.sh"),
            verb: ScriptVerb::Install,
            app_id: "org.gimp.GIMP".to_string(),
            name: "GIMP".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unsafe_app_id_never_runs() {
        let exec = ActionExecutor::default();
        let result = exec.execute(&ItemAction::RunScript {
            script: PathBuf::from("/bin/true"),
            verb: ScriptVerb::Uninstall,
            app_id: "--system".to_string(),
            name: "x".to_string(),
        });
        assert!(result.unwrap_err().contains("Invalid app id"));
    }

    #[cfg(unix)]
    #[test]
    fn test_opener_gets_url() {
        let exec = ActionExecutor::new("true");
        assert!(exec
            .execute(&ItemAction::OpenUrl("https://flathub.org/apps/org.gimp.GIMP".to_string()))
            .is_ok());
    }
}
