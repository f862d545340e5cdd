use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use std::collections::HashMap;
use std::process::Command;
use tracing::debug;

use super::xdotool::merge_window_ids;

pub struct KdotoolLister;

fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = Command::new("id").args(["-u", sudo_user.as_str()]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);
                    let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                    debug!("Подставляем переменные окружения для пользователя {}: uid={}", sudo_user, uid);
                    env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

impl KdotoolLister {
    pub fn new() -> Self {
        Self
    }

    fn create_command(args: &[&str]) -> Command {
        let mut cmd = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            let mut cmd = Command::new("sudo");
            cmd.args(["-E", "-u", sudo_user.as_str(), "kdotool"]);
            cmd.args(args);
            cmd
        } else {
            let mut cmd = Command::new("kdotool");
            cmd.args(args);
            cmd
        };

        for (key, value) in build_env_overrides() {
            cmd.env(key, value);
        }

        cmd
    }

    pub async fn test(&self) -> Result<()> {
        debug!("=== Тестируем kdotool ===");

        let output = Self::create_command(&["getactivewindow"]).output()?;
        if !output.status.success() {
            debug!("kdotool getactivewindow failed: {}", String::from_utf8_lossy(&output.stderr));
            return Err(AntiLeaveError::Probe("kdotool getactivewindow failed".to_string()));
        }

        debug!("=== kdotool работает ===");
        Ok(())
    }

    pub async fn list_windows(&self, patterns: &[String]) -> Result<Vec<WindowHandle>> {
        let mut searches = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let search_output = Self::create_command(&["search", "--name", pattern.as_str()]).output()?;
            if !search_output.status.success() && !search_output.stderr.is_empty() {
                return Err(AntiLeaveError::Probe("kdotool search failed".to_string()));
            }
            searches.push(String::from_utf8_lossy(&search_output.stdout).into_owned());
        }

        let mut windows = Vec::new();
        for id in merge_window_ids(&searches) {
            let name_output = Self::create_command(&["getwindowname", id.as_str()]).output()?;
            if !name_output.status.success() {
                debug!("kdotool getwindowname {} failed", id);
                continue;
            }

            let title = String::from_utf8_lossy(&name_output.stdout).trim().to_string();
            if !title.is_empty() {
                windows.push(WindowHandle::new(title, id));
            }
        }

        Ok(windows)
    }
}
