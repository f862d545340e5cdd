use serde::{Deserialize, Serialize};
use std::fmt;

/// Окно верхнего уровня, полученное при перечислении
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle {
    pub title: String,
    /// Непрозрачный идентификатор (формат зависит от бэкенда)
    pub id: String,
}

impl WindowHandle {
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
        }
    }

    pub fn title_lower(&self) -> String {
        self.title.to_lowercase()
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_empty() {
            write!(f, "\"{}\"", self.title)
        } else {
            write!(f, "\"{}\" ({})", self.title, self.id)
        }
    }
}

/// Снимок окружения за один тик. Нигде не хранится.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub process_running: bool,
    pub windows: Vec<WindowHandle>,
}

impl EnvironmentSnapshot {
    pub fn new(process_running: bool, windows: Vec<WindowHandle>) -> Self {
        Self {
            process_running,
            windows,
        }
    }

    /// Клиент запущен и показывает хотя бы одно окно
    pub fn connected() -> Self {
        Self::new(true, vec![WindowHandle::new("Roblox", "0x1")])
    }

    pub fn disconnected() -> Self {
        Self::new(false, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_handle_display() {
        let window = WindowHandle::new("Roblox", "0x04a00003");
        assert_eq!(window.to_string(), "\"Roblox\" (0x04a00003)");

        let window = WindowHandle::new("Roblox", "");
        assert_eq!(window.to_string(), "\"Roblox\"");
    }

    #[test]
    fn test_title_lower() {
        let window = WindowHandle::new("Roblox - DISCONNECTED", "1");
        assert_eq!(window.title_lower(), "roblox - disconnected");
    }
}
