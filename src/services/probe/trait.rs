use crate::config::Config;
use crate::error::Result;
use crate::events::WindowHandle;
use std::sync::Arc;
use tracing::error;

/// Trait for environment probes that can run in different modes
#[async_trait::async_trait]
pub trait EnvironmentProbe: Send + Sync {
    /// Is any process of the target application running
    async fn process_running(&self) -> Result<bool>;

    /// Top-level windows whose titles match the configured patterns
    async fn target_windows(&self) -> Result<Vec<WindowHandle>>;

    /// Non-failing variant: an enumeration error is logged and reported as `false`
    async fn is_target_process_running(&self) -> bool {
        match self.process_running().await {
            Ok(running) => running,
            Err(e) => {
                error!("Ошибка проверки процесса клиента: {}", e);
                false
            }
        }
    }

    /// Non-failing variant: an enumeration error is logged and reported as no windows
    async fn get_target_windows(&self) -> Vec<WindowHandle> {
        match self.target_windows().await {
            Ok(windows) => windows,
            Err(e) => {
                error!("Ошибка получения окон клиента: {}", e);
                Vec::new()
            }
        }
    }
}

/// Factory function to create an appropriate probe based on the dry_run flag
pub fn create_probe(config: Arc<Config>, dry_run: bool) -> Result<Arc<dyn EnvironmentProbe>> {
    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunProbe::new()))
    } else {
        Ok(Arc::new(super::system_probe::SystemProbe::new(config)?))
    }
}
