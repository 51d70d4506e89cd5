use moorage_config::Settings;
use std::time::Duration;

/// Tunables shared by the orchestrator and the installer.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    /// Project networks are named `{network_prefix}-{project}`.
    pub network_prefix: String,
    /// Grace period before the engine kills a stopping container.
    pub stop_timeout_secs: i64,
    /// Pause between stop and start in a restart.
    pub restart_pause: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            network_prefix: "moorage".to_string(),
            stop_timeout_secs: 10,
            restart_pause: Duration::from_secs(1),
        }
    }
}

impl From<&Settings> for RuntimeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            network_prefix: settings.network_prefix.clone(),
            stop_timeout_secs: settings.stop_timeout_secs,
            restart_pause: settings.restart_pause,
        }
    }
}
