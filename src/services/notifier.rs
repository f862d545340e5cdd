//! Desktop notifications.
//!
//! Linux: `org.freedesktop.Notifications` over the session bus, `notify-send` as fallback.
//! macOS: `osascript`. Windows: toast through PowerShell and the WinRT notification API.
//! Delivery is best-effort; callers go through [`send_notification`].

use crate::config::Config;
use crate::antileave_error;
use crate::error::Result;
use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use zbus::zvariant::Value;
use zbus::Connection;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Отправить уведомление, если они включены. Ошибки только логируются.
pub async fn send_notification(config: &Config, notifier: &dyn Notifier, title: &str, message: &str) {
    if !config.notifications.enabled {
        return;
    }

    if let Err(e) = notifier.notify(title, message).await {
        error!("Ошибка отправки уведомления: {}", e);
    }
}

pub struct DesktopNotifier {
    config: Arc<Config>,
    connection: Mutex<Option<Connection>>,
}

impl DesktopNotifier {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    fn timeout_ms(&self) -> i32 {
        i32::try_from(self.config.notifications.timeout_secs.saturating_mul(1000)).unwrap_or(i32::MAX)
    }

    async fn notify_dbus(&self, title: &str, message: &str) -> Result<()> {
        let mut guard = self.connection.lock().await;
        let connection = match guard.as_ref() {
            Some(connection) => connection.clone(),
            None => {
                let connection = Connection::session().await?;
                *guard = Some(connection.clone());
                connection
            }
        };
        drop(guard);

        let actions: Vec<&str> = Vec::new();
        let hints: HashMap<&str, Value<'_>> = HashMap::new();

        connection
            .call_method(
                Some("org.freedesktop.Notifications"),
                "/org/freedesktop/Notifications",
                Some("org.freedesktop.Notifications"),
                "Notify",
                &(
                    self.config.notifications.app_name.as_str(),
                    0u32,
                    "",
                    title,
                    message,
                    actions,
                    hints,
                    self.timeout_ms(),
                ),
            )
            .await?;

        Ok(())
    }

    fn notify_send(&self, title: &str, message: &str) -> Result<()> {
        let output = Command::new("notify-send")
            .arg(format!("--app-name={}", self.config.notifications.app_name))
            .arg(format!("--expire-time={}", self.timeout_ms()))
            .arg(title)
            .arg(message)
            .output()
            .map_err(|e| antileave_error!(notification, "notify-send failed: {}", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(antileave_error!(notification, "notify-send exited with: {}", output.status))
        }
    }

    fn notify_osascript(&self, title: &str, message: &str) -> Result<()> {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            escape_applescript(message),
            escape_applescript(title)
        );

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .map_err(|e| antileave_error!(notification, "osascript failed: {}", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(antileave_error!(notification, "osascript exited with: {}", output.status))
        }
    }

    fn notify_powershell(&self, title: &str, message: &str) -> Result<()> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(self.toast_script(title, message))
            .output()
            .map_err(|e| antileave_error!(notification, "powershell failed: {}", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(antileave_error!(
                notification,
                "powershell exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    fn toast_script(&self, title: &str, message: &str) -> String {
        format!(
            "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; \
             $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
             $text = $template.GetElementsByTagName('text'); \
             $text.Item(0).AppendChild($template.CreateTextNode('{title}')) | Out-Null; \
             $text.Item(1).AppendChild($template.CreateTextNode('{message}')) | Out-Null; \
             $toast = [Windows.UI.Notifications.ToastNotification]::new($template); \
             $toast.ExpirationTime = [DateTimeOffset]::Now.AddSeconds({timeout}); \
             [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('{app_id}').Show($toast)",
            title = escape_powershell(title),
            message = escape_powershell(message),
            timeout = self.config.notifications.timeout_secs.max(1),
            app_id = POWERSHELL_APP_ID,
        )
    }
}

/// AppUserModelID самого PowerShell: тосты от незарегистрированных приложений не показываются
const POWERSHELL_APP_ID: &str =
    r"{1AC14E77-02E7-4E5D-B744-2EB1AE5198B7}\WindowsPowerShell\v1.0\powershell.exe";

/// Строки в одинарных кавычках PowerShell: кавычка удваивается
fn escape_powershell(text: &str) -> String {
    text.replace('\'', "''")
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', r"\\").replace('"', r#"\""#)
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        if cfg!(target_os = "macos") {
            return self.notify_osascript(title, message);
        }
        if cfg!(target_os = "windows") {
            return self.notify_powershell(title, message);
        }

        match self.notify_dbus(title, message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("D-Bus уведомление не удалось: {}, пробуем notify-send", e);
                self.notify_send(title, message)
            }
        }
    }
}

/// Только логирует уведомления
pub struct DryRunNotifier;

#[async_trait::async_trait]
impl Notifier for DryRunNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!("[DRY RUN] Уведомление: {} - {}", title, message);
        Ok(())
    }
}
