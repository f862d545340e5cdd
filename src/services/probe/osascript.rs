use crate::antileave_error;
use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use std::process::Command;
use tracing::debug;

/// Окна видимых приложений через System Events (macOS).
/// Нужно разрешение «Универсальный доступ» для терминала.
pub struct OsascriptLister;

const LIST_SCRIPT: &str = r#"set out to ""
tell application "System Events"
    repeat with proc in (application processes whose background only is false)
        set procName to name of proc
        try
            repeat with win in windows of proc
                set out to out & procName & tab & (name of win) & linefeed
            end repeat
        end try
    end repeat
end tell
return out"#;

impl OsascriptLister {
    pub fn new() -> Self {
        Self
    }

    fn command() -> Command {
        let mut cmd = Command::new("osascript");
        cmd.args(["-e", LIST_SCRIPT]);
        cmd
    }

    pub async fn test(&self) -> Result<()> {
        let output = Self::command().output()?;
        if output.status.success() {
            Ok(())
        } else {
            debug!("osascript: {}", String::from_utf8_lossy(&output.stderr));
            Err(AntiLeaveError::Probe("osascript failed".to_string()))
        }
    }

    pub async fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let output = Self::command()
            .output()
            .map_err(|e| antileave_error!(probe, "osascript не найден: {}", e))?;

        if !output.status.success() {
            return Err(antileave_error!(
                probe,
                "osascript вернул ошибку: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(parse_process_windows(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Строки `<процесс>\t<заголовок>`; `missing value` - окно без заголовка
fn parse_process_windows(stdout: &str) -> Vec<WindowHandle> {
    stdout
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once('\t'))
        .filter(|(_, title)| !title.is_empty() && *title != "missing value")
        .map(|(process, title)| WindowHandle::new(title, process))
        .collect()
}
