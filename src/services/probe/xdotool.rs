use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use std::process::Command;
use tracing::debug;

pub struct XdotoolLister;

impl XdotoolLister {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").args(["getactivewindow", "getwindowname"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AntiLeaveError::Probe("xdotool failed".to_string()))
        }
    }

    /// Ищем только окна, подходящие под паттерны заголовков:
    /// `getwindowname` вызывается для найденных, а не для всех окон сессии.
    pub async fn list_windows(&self, patterns: &[String]) -> Result<Vec<WindowHandle>> {
        debug!("Получение списка окон через xdotool");
        let mut searches = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let output = Command::new("xdotool")
                .args(["search", "--name", pattern.as_str()])
                .output()
                .map_err(|e| {
                    debug!("xdotool не найден или не работает: {}", e);
                    AntiLeaveError::Probe(format!("xdotool не найден: {}", e))
                })?;

            // search возвращает 1, если ни одно окно не подошло
            if !output.status.success() && !output.stderr.is_empty() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("xdotool вернул ошибку: {}", stderr);
                return Err(AntiLeaveError::Probe(format!("xdotool вернул ошибку: {}", stderr)));
            }

            searches.push(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let mut windows = Vec::new();
        for id in merge_window_ids(&searches) {
            let name_output = Command::new("xdotool").args(["getwindowname", id.as_str()]).output();
            match name_output {
                Ok(output) if output.status.success() => {
                    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !title.is_empty() {
                        windows.push(WindowHandle::new(title, id));
                    }
                }
                // Окно могло закрыться между search и getwindowname
                _ => debug!("Не удалось получить заголовок окна {}", id),
            }
        }

        Ok(windows)
    }
}

/// Идентификаторы из нескольких выводов `search` без повторов, в порядке появления
pub(super) fn merge_window_ids(searches: &[String]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in searches.iter().flat_map(|stdout| stdout.lines()).map(str::trim) {
        if !id.is_empty() && !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
