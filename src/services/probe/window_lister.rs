use crate::config::Config;
use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use crate::trace_if_enabled;
use crate::utils::session::{detect_session, SessionKind};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use super::kdotool::KdotoolLister;
use super::osascript::OsascriptLister;
use super::powershell::PowershellLister;
use super::sway::SwayLister;
use super::wmctrl::WmctrlLister;
use super::xdotool::XdotoolLister;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkingMethod {
    Kdotool,
    Xdotool,
    Wmctrl,
    Sway,
    Powershell,
    Osascript,
}

impl WorkingMethod {
    fn from_config(name: &str) -> Option<Self> {
        match name {
            "kdotool" => Some(Self::Kdotool),
            "xdotool" => Some(Self::Xdotool),
            "wmctrl" => Some(Self::Wmctrl),
            "sway" => Some(Self::Sway),
            "powershell" => Some(Self::Powershell),
            "osascript" => Some(Self::Osascript),
            _ => None,
        }
    }

    /// Порядок перебора методов для графической сессии.
    /// Сначала методы, получающие все заголовки одним вызовом.
    fn candidates(session: SessionKind) -> &'static [WorkingMethod] {
        match session {
            SessionKind::Windows => &[Self::Powershell],
            SessionKind::MacOs => &[Self::Osascript],
            SessionKind::Wayland => &[Self::Sway, Self::Kdotool, Self::Wmctrl, Self::Xdotool],
            _ => &[Self::Wmctrl, Self::Xdotool, Self::Kdotool, Self::Sway],
        }
    }
}

/// Перечисление окон верхнего уровня с фильтрацией по паттернам заголовков
pub struct RealWindowLister {
    config: Arc<Config>,
    session: SessionKind,
    working_method: RwLock<Option<WorkingMethod>>,

    // Утилиты перечисления окон
    kdotool: KdotoolLister,
    xdotool: XdotoolLister,
    wmctrl: WmctrlLister,
    sway: SwayLister,
    powershell: PowershellLister,
    osascript: OsascriptLister,
}

impl RealWindowLister {
    pub fn new(config: Arc<Config>) -> Self {
        let session = detect_session();
        let working_method = WorkingMethod::from_config(&config.detection.window_method);

        if let Some(method) = working_method {
            info!("Метод получения списка окон задан в конфигурации: {:?}", method);
        }

        Self {
            config,
            session,
            working_method: RwLock::new(working_method),
            kdotool: KdotoolLister::new(),
            xdotool: XdotoolLister::new(),
            wmctrl: WmctrlLister::new(),
            sway: SwayLister::new(),
            powershell: PowershellLister::new(),
            osascript: OsascriptLister::new(),
        }
    }

    async fn test_method(&self, method: WorkingMethod) -> Result<()> {
        match method {
            WorkingMethod::Kdotool => self.kdotool.test().await,
            WorkingMethod::Xdotool => self.xdotool.test().await,
            WorkingMethod::Wmctrl => self.wmctrl.test().await,
            WorkingMethod::Sway => self.sway.test().await,
            WorkingMethod::Powershell => self.powershell.test().await,
            WorkingMethod::Osascript => self.osascript.test().await,
        }
    }

    async fn detect_working_method(&self) -> Result<WorkingMethod> {
        info!("Определяем рабочий метод получения списка окон ({:?})...", self.session);

        for &method in WorkingMethod::candidates(self.session) {
            if self.test_method(method).await.is_ok() {
                info!("Используем {:?}", method);
                return Ok(method);
            }
        }

        Err(AntiLeaveError::ServiceUnavailable(
            "Ни один метод получения списка окон не работает".to_string(),
        ))
    }

    async fn list_by_method(&self, method: WorkingMethod) -> Result<Vec<WindowHandle>> {
        let patterns = &self.config.detection.window_title_patterns;
        match method {
            WorkingMethod::Kdotool => self.kdotool.list_windows(patterns).await,
            WorkingMethod::Xdotool => self.xdotool.list_windows(patterns).await,
            WorkingMethod::Wmctrl => self.wmctrl.list_windows().await,
            WorkingMethod::Sway => self.sway.list_windows().await,
            WorkingMethod::Powershell => self.powershell.list_windows().await,
            WorkingMethod::Osascript => self.osascript.list_windows().await,
        }
    }

    /// Все окна верхнего уровня. Если закешированный метод перестал работать,
    /// метод определяется заново один раз.
    async fn all_windows(&self) -> Result<Vec<WindowHandle>> {
        let cached = *self.working_method.read();

        let method = match cached {
            Some(method) => method,
            None => {
                let method = self.detect_working_method().await?;
                *self.working_method.write() = Some(method);
                method
            }
        };

        match self.list_by_method(method).await {
            Ok(windows) => Ok(windows),
            Err(e) => {
                warn!("Рабочий метод {:?} перестал работать: {}. Переопределяем...", method, e);
                let new_method = self.detect_working_method().await?;
                *self.working_method.write() = Some(new_method);
                self.list_by_method(new_method).await
            }
        }
    }

    pub async fn target_windows(&self) -> Result<Vec<WindowHandle>> {
        let windows = self.all_windows().await?;
        let total = windows.len();

        let matching: Vec<WindowHandle> = windows
            .into_iter()
            .filter(|window| !window.title.is_empty() && self.config.title_matches(&window.title))
            .collect();

        trace_if_enabled!("Окон всего: {}, подходящих: {}", total, matching.len());
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_from_config() {
        assert_eq!(WorkingMethod::from_config("auto"), None);
        assert_eq!(WorkingMethod::from_config("wmctrl"), Some(WorkingMethod::Wmctrl));
        assert_eq!(WorkingMethod::from_config("powershell"), Some(WorkingMethod::Powershell));
    }

    #[test]
    fn candidates_never_empty() {
        for session in [
            SessionKind::Wayland,
            SessionKind::X11,
            SessionKind::Windows,
            SessionKind::MacOs,
            SessionKind::Headless,
        ] {
            assert!(!WorkingMethod::candidates(session).is_empty());
        }
        assert_eq!(WorkingMethod::candidates(SessionKind::Windows), &[WorkingMethod::Powershell]);
    }

    #[test]
    fn macos_lists_windows_through_system_events() {
        assert_eq!(WorkingMethod::candidates(SessionKind::MacOs), &[WorkingMethod::Osascript]);
        assert_eq!(WorkingMethod::from_config("osascript"), Some(WorkingMethod::Osascript));
    }

    #[test]
    fn single_call_backends_come_first() {
        assert_eq!(WorkingMethod::candidates(SessionKind::X11)[0], WorkingMethod::Wmctrl);
        assert_eq!(WorkingMethod::candidates(SessionKind::Wayland)[0], WorkingMethod::Sway);
    }
}
