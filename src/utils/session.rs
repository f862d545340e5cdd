use crate::config::Config;
use tracing::{info, warn};

/// Тип графической сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Wayland,
    X11,
    Windows,
    MacOs,
    Headless,
}

fn classify_session(session_type: Option<&str>, has_wayland: bool, has_display: bool) -> SessionKind {
    if cfg!(target_os = "windows") {
        return SessionKind::Windows;
    }
    if cfg!(target_os = "macos") {
        return SessionKind::MacOs;
    }

    match session_type {
        Some("wayland") => SessionKind::Wayland,
        Some("x11") => SessionKind::X11,
        _ if has_wayland => SessionKind::Wayland,
        _ if has_display => SessionKind::X11,
        _ => SessionKind::Headless,
    }
}

/// Определить текущую графическую сессию по переменным окружения
pub fn detect_session() -> SessionKind {
    let session_type = std::env::var("XDG_SESSION_TYPE").ok();
    classify_session(
        session_type.as_deref(),
        std::env::var_os("WAYLAND_DISPLAY").is_some(),
        std::env::var_os("DISPLAY").is_some(),
    )
}

/// Проверить окружение перед запуском мониторинга. Только предупреждения.
pub fn check_session(config: &Config) -> SessionKind {
    info!("Проверка окружения...");

    let session = detect_session();
    info!("Графическая сессия: {:?}", session);

    if session == SessionKind::Headless && config.detection.enable_window_monitoring {
        warn!("⚠️  Не найдена графическая сессия (DISPLAY/WAYLAND_DISPLAY)");
        warn!("   Список окон будет недоступен, отключите enable_window_monitoring");
    }

    // Из-под sudo теряется доступ к пользовательской сессии D-Bus и буферу обмена
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Уведомления и буфер обмена пользователя могут быть недоступны");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }

    session
}
