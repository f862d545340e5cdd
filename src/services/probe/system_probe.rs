use crate::config::Config;
use crate::error::Result;
use crate::events::WindowHandle;
use std::sync::Arc;
use tracing::info;

use super::process::ProcessScanner;
use super::r#trait::EnvironmentProbe;
use super::window_lister::RealWindowLister;

/// Опрос реального окружения: процессы через sysinfo, окна через утилиты рабочего стола
pub struct SystemProbe {
    config: Arc<Config>,
    processes: ProcessScanner,
    windows: RealWindowLister,
}

impl SystemProbe {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Инициализация SystemProbe");

        Ok(Self {
            processes: ProcessScanner::new(config.clone()),
            windows: RealWindowLister::new(config.clone()),
            config,
        })
    }
}

#[async_trait::async_trait]
impl EnvironmentProbe for SystemProbe {
    async fn process_running(&self) -> Result<bool> {
        if !self.config.detection.enable_process_monitoring {
            return Ok(true);
        }
        self.processes.is_running()
    }

    async fn target_windows(&self) -> Result<Vec<WindowHandle>> {
        self.windows.target_windows().await
    }
}
