use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use std::process::Command;

/// Главные окна процессов через PowerShell (Windows)
pub struct PowershellLister;

const LIST_SCRIPT: &str = "Get-Process | Where-Object { $_.MainWindowTitle } | \
    ForEach-Object { \"$($_.MainWindowHandle)`t$($_.MainWindowTitle)\" }";

impl PowershellLister {
    pub fn new() -> Self {
        Self
    }

    fn command() -> Command {
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command", LIST_SCRIPT]);
        cmd
    }

    pub async fn test(&self) -> Result<()> {
        let output = Self::command().output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AntiLeaveError::Probe("powershell failed".to_string()))
        }
    }

    pub async fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let output = Self::command()
            .output()
            .map_err(|e| AntiLeaveError::Probe(format!("powershell не найден: {}", e)))?;

        if !output.status.success() {
            return Err(AntiLeaveError::Probe("powershell вернул ошибку".to_string()));
        }

        Ok(parse_window_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_window_lines(stdout: &str) -> Vec<WindowHandle> {
    stdout
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once('\t'))
        .filter(|(_, title)| !title.is_empty())
        .map(|(handle, title)| WindowHandle::new(title, handle))
        .collect()
}
