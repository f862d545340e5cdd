use crate::error::{AntiLeaveError, Result};
use std::process::Command;
use tracing::debug;

/// Чтение текста из системного буфера обмена
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    async fn read_text(&self) -> Result<String>;
}

/// Буфер обмена через утилиты платформы (wl-paste, xclip, xsel, pbpaste, powershell)
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn candidates() -> Vec<(&'static str, Vec<&'static str>)> {
        if cfg!(target_os = "windows") {
            vec![("powershell", vec!["-NoProfile", "-NonInteractive", "-Command", "Get-Clipboard"])]
        } else if cfg!(target_os = "macos") {
            vec![("pbpaste", Vec::new())]
        } else {
            let mut tools = Vec::new();
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                tools.push(("wl-paste", vec!["--no-newline"]));
            }
            tools.push(("xclip", vec!["-selection", "clipboard", "-o"]));
            tools.push(("xsel", vec!["--clipboard", "--output"]));
            tools
        }
    }
}

#[async_trait::async_trait]
impl Clipboard for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        for (tool, args) in Self::candidates() {
            match Command::new(tool).args(args).output() {
                Ok(output) if output.status.success() => {
                    return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
                }
                Ok(output) => {
                    debug!("{} вернул ошибку: {}", tool, String::from_utf8_lossy(&output.stderr));
                }
                Err(e) => debug!("{} недоступен: {}", tool, e),
            }
        }

        Err(AntiLeaveError::Clipboard("ни одна утилита буфера обмена не сработала".to_string()))
    }
}
