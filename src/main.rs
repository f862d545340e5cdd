use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{Config, LoggingConfig};
use services::link::{is_valid_link, normalize_link};
use services::{create_monitor, create_probe};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const LINK_FORMAT_HINT: &str = "https://www.roblox.com/share?code=CODE&type=Server";

#[derive(Parser, Debug)]
#[command(name = "antileave-rust")]
#[command(about = "Автоматическое переподключение к приватному серверу Roblox при вылете")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "antileave.toml")]
    config: String,

    /// Ссылка на приватный сервер
    #[arg(short, long)]
    url: Option<String>,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,

    /// Проверить и нормализовать ссылку, затем выйти
    #[arg(long, value_name = "URL")]
    check: Option<String>,

    /// Один раз опросить окружение и вывести результат
    #[arg(long)]
    probe: bool,

    /// Не спрашивать ссылку интерактивно
    #[arg(long)]
    no_prompt: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(url) = &args.check {
        return check_link(url);
    }

    // Ошибку загрузки логируем после инициализации tracing
    let (config, load_error) = Config::load_or_default(&args.config);
    init_tracing(&config.logging, args.log_level.as_deref())?;

    info!("Запуск Roblox Anti-Leave v{}", env!("CARGO_PKG_VERSION"));

    match load_error {
        Some(e) => warn!("Не удалось загрузить конфигурацию: {:#}. Используются значения по умолчанию", e),
        None => info!("Конфигурация загружена из: {}", args.config),
    }
    let config = Arc::new(config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    utils::session::check_session(&config);

    if args.probe {
        let probe = create_probe(config.clone(), args.dry_run)?;
        println!("Процесс клиента запущен: {}", probe.is_target_process_running().await);
        let windows = probe.get_target_windows().await;
        println!("Подходящих окон: {}", windows.len());
        for window in windows {
            println!("  {}", window);
        }
        return Ok(());
    }

    let target_url = resolve_target_url(&args)?;

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let mut monitor = create_monitor(config.clone(), args.dry_run)?.with_events(events_tx);
    let stop = monitor.stop_handle();

    info!("Все компоненты инициализированы");

    let mut monitor_handle = tokio::spawn(async move {
        let reason = monitor.start(target_url).await;
        (reason, monitor.state().clone())
    });

    // Фронтенд только читает канал статусов
    let display_handle = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            println!("[статус] {}", event);
        }
    });

    println!("Нажмите Ctrl+C для остановки");

    let finished = tokio::select! {
        result = &mut monitor_handle => Some(result),
        signal = signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
            None
        }
    };

    let finished = match finished {
        Some(result) => Some(result),
        None => {
            stop.stop();
            // Цикл замечает остановку только между итерациями
            match timeout(SHUTDOWN_TIMEOUT, &mut monitor_handle).await {
                Ok(result) => Some(result),
                Err(_) => {
                    warn!("Таймаут при завершении мониторинга, прерываем задачу");
                    monitor_handle.abort();
                    None
                }
            }
        }
    };

    match finished {
        Some(Ok((reason, state))) => info!(
            "Сессия завершена ({}): попыток переподключения {}, отключений подряд {}",
            reason, state.reconnect_attempts, state.consecutive_disconnects
        ),
        Some(Err(e)) => error!("Ошибка в задаче мониторинга: {}", e),
        None => {}
    }

    let _ = display_handle.await;

    info!("Roblox Anti-Leave завершил работу");
    Ok(())
}

fn check_link(url: &str) -> Result<()> {
    let normalized = normalize_link(url.trim());
    if is_valid_link(&normalized) {
        println!("✓ Ссылка на приватный сервер корректна: {}", normalized);
        Ok(())
    } else {
        anyhow::bail!("Неверный формат ссылки. Поддерживается только: {}", LINK_FORMAT_HINT)
    }
}

/// Ссылка из аргументов или интерактивного ввода. Пустая строка - без ссылки.
fn resolve_target_url(args: &Args) -> Result<Option<String>> {
    let raw = match &args.url {
        Some(url) => url.trim().to_string(),
        None if args.no_prompt || !std::io::stdin().is_terminal() => return Ok(None),
        None => prompt_for_url()?,
    };

    if raw.is_empty() {
        info!("Ссылка не указана, при вылете клиент будет запущен напрямую");
        return Ok(None);
    }

    let normalized = normalize_link(&raw);
    if !is_valid_link(&normalized) {
        anyhow::bail!("Неверный формат ссылки. Поддерживается только: {}", LINK_FORMAT_HINT);
    }

    println!("✓ Ссылка на приватный сервер корректна");
    Ok(Some(normalized))
}

fn prompt_for_url() -> Result<String> {
    println!("Поддерживаются только ссылки на приватные серверы:");
    println!("  {}", LINK_FORMAT_HINT);
    println!("Введите ссылку (Enter - пропустить): ");

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Не удалось прочитать ссылку")?;
    Ok(line.trim().to_string())
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    use std::fs::OpenOptions;
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let console_layer = if logging.console {
        let layer = if logging.format == "pretty" {
            fmt::layer().pretty().boxed()
        } else {
            fmt::layer().compact().boxed()
        };
        Some(layer)
    } else {
        None
    };

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Не удалось открыть лог-файл {}", path))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
