use crate::flatpak::{IconLookup, LocalPackageManager};
use crate::models::{
    EnrichedResult, InstalledApp, ItemAction, ResultItem, ScriptVerb, DOWNLOAD_ICON,
    FALLBACK_ICON, FLATHUB_APP_URL, REMOVE_ICON, UPDATE_ICON,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Turns search results into launcher items with their action submenus.
pub struct ResultPresenter {
    packages: Arc<dyn LocalPackageManager>,
    icons: Arc<dyn IconLookup>,
    script: PathBuf,
}

impl ResultPresenter {
    pub fn new(
        packages: Arc<dyn LocalPackageManager>,
        icons: Arc<dyn IconLookup>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            packages,
            icons,
            script: script.into(),
        }
    }

    fn script_action(&self, verb: ScriptVerb, app_id: &str, name: &str) -> ItemAction {
        ItemAction::RunScript {
            script: self.script.clone(),
            verb,
            app_id: app_id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn installed_actions(&self, name: &str, app_id: &str) -> Vec<ResultItem> {
        vec![
            ResultItem::new(
                "Update",
                UPDATE_ICON,
                self.script_action(ScriptVerb::Update, app_id, name),
            ),
            ResultItem::new(
                "Uninstall",
                REMOVE_ICON,
                self.script_action(ScriptVerb::Uninstall, app_id, name),
            ),
        ]
    }

    pub fn not_installed_actions(&self, name: &str, app_id: &str) -> Vec<ResultItem> {
        vec![
            ResultItem::new(
                "Install",
                DOWNLOAD_ICON,
                self.script_action(ScriptVerb::Install, app_id, name),
            ),
            ResultItem::new(
                "Open in browser",
                FALLBACK_ICON,
                ItemAction::OpenUrl(format!("{}/{}", FLATHUB_APP_URL, app_id)),
            ),
        ]
    }

    /// Installed state is asked for live, never cached.
    pub async fn result_actions(&self, name: &str, app_id: &str) -> Vec<ResultItem> {
        if self.packages.is_installed(app_id).await {
            log::info!("Generating actions for installed app - {}", name);
            self.installed_actions(name, app_id)
        } else {
            log::info!("Generating actions for non-installed app - {}", name);
            self.not_installed_actions(name, app_id)
        }
    }

    pub async fn present_remote(&self, results: Vec<EnrichedResult>) -> Vec<ResultItem> {
        let items = results.into_iter().map(|result| async move {
            let actions = self
                .result_actions(&result.app.name, &result.app.app_id)
                .await;
            ResultItem::new(
                result.app.name.clone(),
                result.icon.display_path(),
                ItemAction::RenderResultList(actions),
            )
            .with_description(result.app.app_id)
        });
        futures::future::join_all(items).await
    }

    /// Local listings only ever contain installed apps.
    pub async fn present_local(&self, apps: Vec<InstalledApp>) -> Vec<ResultItem> {
        let items = apps.into_iter().map(|app| async move {
            let icon = self.icons.find(&app.app_id).await;
            let actions = self.installed_actions(&app.name, &app.app_id);
            ResultItem::new(app.name, icon, ItemAction::RenderResultList(actions))
                .with_description(app.app_id)
        });
        futures::future::join_all(items).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockIconLookup, MockPackageManager};
    use crate::models::{IconResolution, RemoteApp};

    fn presenter(packages: &MockPackageManager, icons: &MockIconLookup) -> ResultPresenter {
        ResultPresenter::new(
            Arc::new(packages.clone()),
            Arc::new(icons.clone()),
            "scripts/flatpak-helper.sh",
        )
    }

    fn names(items: &[ResultItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    fn enriched(app_id: &str, name: &str, icon: IconResolution) -> EnrichedResult {
        EnrichedResult {
            app: RemoteApp {
                app_id: app_id.to_string(),
                name: name.to_string(),
                icon_url: "https://x/icon.png".to_string(),
            },
            icon,
        }
    }

    #[tokio::test]
    async fn test_remote_actions_follow_installed_state() {
        let packages = MockPackageManager::new();
        packages.set_installed("org.gimp.GIMP", true);
        let p = presenter(&packages, &MockIconLookup::new());

        let items = p
            .present_remote(vec![
                enriched(
                    "org.gimp.GIMP",
                    "GIMP",
                    IconResolution::Resolved(PathBuf::from("/tmp/gimp.png")),
                ),
                enriched("org.mozilla.firefox", "Firefox", IconResolution::Fallback),
            ])
            .await;

        assert_eq!(names(&items), vec!["GIMP", "Firefox"]);
        assert_eq!(items[0].icon, "/tmp/gimp.png");
        assert_eq!(items[1].icon, FALLBACK_ICON);

        let gimp = items[0].submenu().expect("submenu");
        assert_eq!(names(gimp), vec!["Update", "Uninstall"]);

        let firefox = items[1].submenu().expect("submenu");
        assert_eq!(names(firefox), vec!["Install", "Open in browser"]);
        assert_eq!(
            firefox[1].on_enter,
            ItemAction::OpenUrl("https://flathub.org/apps/org.mozilla.firefox".to_string())
        );
    }

    #[tokio::test]
    async fn test_script_actions_carry_id_and_name() {
        let p = presenter(&MockPackageManager::new(), &MockIconLookup::new());
        let actions = p.not_installed_actions("Visual Studio Code", "com.visualstudio.code");

        match &actions[0].on_enter {
            ItemAction::RunScript {
                script,
                verb,
                app_id,
                name,
            } => {
                assert_eq!(script, &PathBuf::from("scripts/flatpak-helper.sh"));
                assert_eq!(*verb, ScriptVerb::Install);
                assert_eq!(app_id, "com.visualstudio.code");
                assert_eq!(name, "Visual Studio Code");
            }
            other => panic!("Wrong action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_local_items_are_always_installed() {
        let packages = MockPackageManager::new();
        let icons = MockIconLookup::new();
        icons.add_icon("org.gimp.GIMP", "/var/lib/flatpak/exports/share/icons/org.gimp.GIMP.svg");
        let p = presenter(&packages, &icons);

        let items = p
            .present_local(vec![
                InstalledApp {
                    name: "GIMP".to_string(),
                    app_id: "org.gimp.GIMP".to_string(),
                },
                InstalledApp {
                    name: "Firefox".to_string(),
                    app_id: "org.mozilla.firefox".to_string(),
                },
            ])
            .await;

        assert_eq!(items[0].icon, "/var/lib/flatpak/exports/share/icons/org.gimp.GIMP.svg");
        assert_eq!(items[1].icon, FALLBACK_ICON);
        for item in &items {
            assert_eq!(names(item.submenu().expect("submenu")), vec!["Update", "Uninstall"]);
        }
        // No installed-state lookups for local results
        assert!(packages.command_history.lock().unwrap().is_empty());
    }
}
