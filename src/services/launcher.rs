use crate::antileave_error;
use crate::error::{AntiLeaveError, Result};
use std::process::Command;
use tracing::info;

/// Открытие ссылок и запуск приложений. Fire-and-forget: результат запуска не ждём.
#[async_trait::async_trait]
pub trait Launcher: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<()>;
    async fn launch(&self, command: &[String]) -> Result<()>;
}

pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }

    fn open_command(url: &str) -> Command {
        let argv = open_argv(std::env::consts::OS, url);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        cmd
    }
}

/// Команда открытия ссылки браузером по умолчанию.
/// На Windows не через `cmd /C start`: cmd режет строку по `&` в query.
fn open_argv(target_os: &str, url: &str) -> Vec<String> {
    let program: &[&str] = match target_os {
        "windows" => &["rundll32", "url.dll,FileProtocolHandler"],
        "macos" => &["open"],
        _ => &["xdg-open"],
    };
    program
        .iter()
        .map(|part| part.to_string())
        .chain(std::iter::once(url.to_string()))
        .collect()
}

#[async_trait::async_trait]
impl Launcher for SystemLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        info!("[OpenURL] Открываем: {}", url);
        Self::open_command(url)
            .spawn()
            .map(|_| ())
            .map_err(|e| antileave_error!(launch, "Не удалось открыть ссылку {}: {}", url, e))
    }

    async fn launch(&self, command: &[String]) -> Result<()> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AntiLeaveError::Launch("пустая команда запуска".to_string()))?;

        info!("Запуск клиента: {}", command.join(" "));
        Command::new(program)
            .args(args)
            .spawn()
            .map(|_| ())
            .map_err(|e| antileave_error!(launch, "Не удалось запустить {}: {}", program, e))
    }
}

/// Только логирует действия
pub struct DryRunLauncher;

#[async_trait::async_trait]
impl Launcher for DryRunLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        info!("[DRY RUN] Открытие ссылки: {}", url);
        Ok(())
    }

    async fn launch(&self, command: &[String]) -> Result<()> {
        info!("[DRY RUN] Запуск клиента: {}", command.join(" "));
        Ok(())
    }
}
