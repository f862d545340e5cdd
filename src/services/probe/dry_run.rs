use crate::error::Result;
use crate::events::{EnvironmentSnapshot, WindowHandle};
use std::time::{Duration, Instant};
use tracing::info;

use super::r#trait::EnvironmentProbe;

const PHASE: Duration = Duration::from_secs(20);

/// Эмуляция сессии: игра, вылет, повторный вход, всплывающее окно о кике
pub struct DryRunProbe {
    started: Instant,
    script: Vec<EnvironmentSnapshot>,
}

impl DryRunProbe {
    pub fn new() -> Self {
        info!("Dry-run режим - EnvironmentProbe работает в режиме эмуляции");

        Self {
            started: Instant::now(),
            script: vec![
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::disconnected(),
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::new(
                    true,
                    vec![WindowHandle::new("Roblox - Kicked for being AFK - dry_run", "0xdead")],
                ),
            ],
        }
    }

    fn current(&self) -> &EnvironmentSnapshot {
        let phase = (self.started.elapsed().as_secs() / PHASE.as_secs()) as usize;
        &self.script[phase % self.script.len()]
    }
}

#[async_trait::async_trait]
impl EnvironmentProbe for DryRunProbe {
    async fn process_running(&self) -> Result<bool> {
        Ok(self.current().process_running)
    }

    async fn target_windows(&self) -> Result<Vec<WindowHandle>> {
        Ok(self.current().windows.clone())
    }
}
