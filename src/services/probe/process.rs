use crate::config::Config;
use crate::error::{AntiLeaveError, Result};
use crate::trace_if_enabled;
use parking_lot::Mutex;
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Поиск процессов клиента через sysinfo
pub struct ProcessScanner {
    config: Arc<Config>,
    system: Mutex<System>,
    own_pid: u32,
}

impl ProcessScanner {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            system: Mutex::new(System::new()),
            own_pid: std::process::id(),
        }
    }

    /// Имена всех процессов, кроме собственного
    fn process_names(&self) -> Result<Vec<String>> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

        // Пустая таблица процессов означает, что перечисление не удалось
        if system.processes().is_empty() {
            return AntiLeaveError::probe("таблица процессов пуста");
        }

        Ok(system
            .processes()
            .iter()
            .filter(|(pid, _)| pid.as_u32() != self.own_pid)
            .map(|(_, process)| process.name().to_string_lossy().into_owned())
            .collect())
    }

    pub fn is_running(&self) -> Result<bool> {
        let names = self.process_names()?;
        let found = names
            .iter()
            .find(|name| self.config.is_target_process_name(name));

        if let Some(name) = found {
            trace_if_enabled!("Найден процесс клиента: {}", name);
        }

        Ok(found.is_some())
    }
}
