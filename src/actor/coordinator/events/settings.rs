use tracing::debug;

use crate::actor::coordinator::Coordinator;
use crate::common::config::SettingsPatch;

pub struct SettingsEventHandler;

impl SettingsEventHandler {
    pub fn handle_settings_changed(coordinator: &mut Coordinator, patch: SettingsPatch) {
        let delta = coordinator.settings.apply(&patch);
        debug!(?patch, "settings changed");
        if let Some(enabled) = delta.auto_close_toggled {
            coordinator.set_auto_close(enabled);
        }
    }
}
