use crate::antileave_error;
use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use std::process::Command;

pub struct WmctrlLister;

impl WmctrlLister {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("wmctrl").args(["-l"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AntiLeaveError::Probe("wmctrl failed".to_string()))
        }
    }

    pub async fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let output = Command::new("wmctrl")
            .args(["-l"])
            .output()
            .map_err(|e| antileave_error!(probe, "wmctrl не найден: {}", e))?;

        if !output.status.success() {
            return Err(AntiLeaveError::Probe("wmctrl вернул ошибку".to_string()));
        }

        Ok(parse_wmctrl_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Строка `wmctrl -l`: `<id> <desktop> <host> <title...>`
fn parse_wmctrl_list(stdout: &str) -> Vec<WindowHandle> {
    stdout
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() > 3 {
                Some(WindowHandle::new(parts[3..].join(" "), parts[0]))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wmctrl_output() {
        let stdout = "0x04a00003  0 host Roblox\n\
                      0x04c00007 -1 host Natural Disaster - Roblox\n\
                      0x01e00001  0 host\n";
        let windows = parse_wmctrl_list(stdout);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], WindowHandle::new("Roblox", "0x04a00003"));
        assert_eq!(windows[1].title, "Natural Disaster - Roblox");
    }
}
