use crate::config::Config;
use crate::debug_if_enabled;
use crate::services::clipboard::Clipboard;
use crate::services::launcher::Launcher;
use crate::services::link::{has_private_server_link_code, is_valid_link, normalize_link, share_code};
use crate::services::state::MonitorState;
use crate::utils::Clock;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Переподключение: открывает ссылку на приватный сервер или запускает клиент напрямую
pub struct Reconnector {
    config: Arc<Config>,
    clipboard: Arc<dyn Clipboard>,
    launcher: Arc<dyn Launcher>,
    clock: Arc<dyn Clock>,
}

impl Reconnector {
    pub fn new(
        config: Arc<Config>,
        clipboard: Arc<dyn Clipboard>,
        launcher: Arc<dyn Launcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            clipboard,
            launcher,
            clock,
        }
    }

    /// Ссылка из буфера обмена, если она подходящего формата
    async fn link_from_clipboard(&self) -> Option<String> {
        if !self.config.detection.enable_clipboard_detection {
            return None;
        }

        match self.clipboard.read_text().await {
            Ok(text) if is_valid_link(&text) => {
                debug_if_enabled!("В буфере обмена найдена ссылка на сервер");
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                debug_if_enabled!("Буфер обмена недоступен: {}", e);
                None
            }
        }
    }

    /// Одна попытка переподключения. Счётчик попыток и время отключения
    /// обновляются всегда, даже при ошибке.
    pub async fn reconnect(&self, state: &mut MonitorState) -> bool {
        info!("Попытка переподключения #{}", state.reconnect_attempts + 1);

        let stored = state.target_url.clone().filter(|url| is_valid_link(url));
        let link = match self.link_from_clipboard().await {
            Some(link) => Some(link),
            None => stored,
        };

        let success = match link {
            Some(link) => self.open_link(&link).await,
            None => self.launch_client().await,
        };

        state.reconnect_attempts += 1;
        state.last_disconnection_time = state.last_disconnection_time.max(self.clock.now());

        success
    }

    async fn open_link(&self, link: &str) -> bool {
        let url = normalize_link(link);
        match share_code(&url) {
            Some(code) => info!("Переподключение к серверу с кодом {}: {}", code, url),
            None => info!("Переподключение к: {}", url),
        }
        if has_private_server_link_code(&url) {
            info!("Обнаружена ссылка старого формата privateServerLinkCode");
        }

        match self.launcher.open_url(&url).await {
            Ok(()) => {
                sleep(self.config.browser_wait()).await;
                info!("Ссылка открыта, клиент подключится к приватному серверу автоматически");
                true
            }
            Err(e) => {
                error!("Ошибка при переподключении: {}", e);
                false
            }
        }
    }

    async fn launch_client(&self) -> bool {
        info!("Ссылка на сервер недоступна, запускаем клиент напрямую");

        let command = &self.config.reconnect.launch_command;
        if let Err(e) = self.launcher.launch(command).await {
            warn!("Прямой запуск не удался: {}. Открываем сайт", e);
            if let Err(e) = self.launcher.open_url(&self.config.reconnect.fallback_url).await {
                error!("Ошибка при переподключении: {}", e);
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{AntiLeaveError, Result};
    use parking_lot::Mutex;

    pub(crate) const LINK: &str = "https://www.roblox.com/share?code=ABC123&type=Server";

    pub(crate) struct FixedClock(pub(crate) f64);

    impl Clock for FixedClock {
        fn now(&self) -> f64 {
            self.0
        }
    }

    pub(crate) struct FakeClipboard(pub(crate) Option<String>);

    #[async_trait::async_trait]
    impl Clipboard for FakeClipboard {
        async fn read_text(&self) -> Result<String> {
            self.0
                .clone()
                .ok_or_else(|| AntiLeaveError::Clipboard("нет буфера обмена".to_string()))
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Open(String),
        Launch(Vec<String>),
    }

    /// Запоминает вызовы; может отказывать в запуске и/или открытии ссылок
    #[derive(Default)]
    pub(crate) struct RecordingLauncher {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub(crate) fail_launch: bool,
        pub(crate) fail_open: bool,
    }

    #[async_trait::async_trait]
    impl Launcher for RecordingLauncher {
        async fn open_url(&self, url: &str) -> Result<()> {
            self.calls.lock().push(Call::Open(url.to_string()));
            if self.fail_open {
                return Err(AntiLeaveError::Launch("браузер не найден".to_string()));
            }
            Ok(())
        }

        async fn launch(&self, command: &[String]) -> Result<()> {
            self.calls.lock().push(Call::Launch(command.to_vec()));
            if self.fail_launch {
                return Err(AntiLeaveError::Launch("клиент не установлен".to_string()));
            }
            Ok(())
        }
    }

    fn build_reconnector(
        config: Config,
        clipboard: Option<&str>,
        launcher: Arc<RecordingLauncher>,
    ) -> Reconnector {
        Reconnector::new(
            Arc::new(config),
            Arc::new(FakeClipboard(clipboard.map(str::to_string))),
            launcher,
            Arc::new(FixedClock(5000.0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn opens_stored_link_when_clipboard_unavailable() {
        let launcher = Arc::new(RecordingLauncher::default());
        let reconnector = build_reconnector(Config::default(), None, launcher.clone());
        let mut state = MonitorState::new(Some(LINK.to_string()));

        assert!(reconnector.reconnect(&mut state).await);

        assert_eq!(*launcher.calls.lock(), vec![Call::Open(LINK.to_string())]);
        assert_eq!(state.reconnect_attempts, 1);
        assert_eq!(state.last_disconnection_time, 5000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn clipboard_link_wins_and_is_normalized() {
        let launcher = Arc::new(RecordingLauncher::default());
        let reconnector = build_reconnector(
            Config::default(),
            Some("roblox.com/share?code=FROMCLIP&type=Server"),
            launcher.clone(),
        );
        let mut state = MonitorState::new(Some(LINK.to_string()));

        assert!(reconnector.reconnect(&mut state).await);

        assert_eq!(
            *launcher.calls.lock(),
            vec![Call::Open("https://roblox.com/share?code=FROMCLIP&type=Server".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clipboard_ignored_when_detection_disabled_or_invalid() {
        let mut config = Config::default();
        config.detection.enable_clipboard_detection = false;
        let launcher = Arc::new(RecordingLauncher::default());
        let reconnector = build_reconnector(
            config,
            Some("roblox.com/share?code=FROMCLIP&type=Server"),
            launcher.clone(),
        );
        let mut state = MonitorState::new(Some(LINK.to_string()));
        assert!(reconnector.reconnect(&mut state).await);
        assert_eq!(*launcher.calls.lock(), vec![Call::Open(LINK.to_string())]);

        let launcher = Arc::new(RecordingLauncher::default());
        let reconnector = build_reconnector(Config::default(), Some("hello world"), launcher.clone());
        let mut state = MonitorState::new(Some(LINK.to_string()));
        assert!(reconnector.reconnect(&mut state).await);
        assert_eq!(*launcher.calls.lock(), vec![Call::Open(LINK.to_string())]);
    }

    #[tokio::test]
    async fn launches_client_without_valid_link() {
        let config = Config::default();
        let command = config.reconnect.launch_command.clone();
        let launcher = Arc::new(RecordingLauncher::default());
        let reconnector = build_reconnector(config, None, launcher.clone());
        let mut state = MonitorState::new(Some("https://www.roblox.com/games/1".to_string()));

        assert!(reconnector.reconnect(&mut state).await);

        assert_eq!(*launcher.calls.lock(), vec![Call::Launch(command)]);
        assert_eq!(state.reconnect_attempts, 1);
    }

    #[tokio::test]
    async fn falls_back_to_website_when_launch_fails() {
        let config = Config::default();
        let command = config.reconnect.launch_command.clone();
        let launcher = Arc::new(RecordingLauncher {
            fail_launch: true,
            ..Default::default()
        });
        let reconnector = build_reconnector(config, None, launcher.clone());
        let mut state = MonitorState::new(None);

        assert!(reconnector.reconnect(&mut state).await);

        assert_eq!(
            *launcher.calls.lock(),
            vec![
                Call::Launch(command),
                Call::Open("https://www.roblox.com/".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn failure_still_counts_attempt() {
        let launcher = Arc::new(RecordingLauncher {
            fail_open: true,
            ..Default::default()
        });
        let reconnector = build_reconnector(Config::default(), None, launcher.clone());
        let mut state = MonitorState::new(Some(LINK.to_string()));

        assert!(!reconnector.reconnect(&mut state).await);

        assert_eq!(state.reconnect_attempts, 1);
        assert_eq!(state.last_disconnection_time, 5000.0);
    }

    #[tokio::test]
    async fn launch_and_fallback_both_failing_reports_failure() {
        let config = Config::default();
        let command = config.reconnect.launch_command.clone();
        let launcher = Arc::new(RecordingLauncher {
            fail_launch: true,
            fail_open: true,
            ..Default::default()
        });
        let reconnector = build_reconnector(config, None, launcher.clone());
        let mut state = MonitorState::new(None);

        assert!(!reconnector.reconnect(&mut state).await);

        assert_eq!(
            *launcher.calls.lock(),
            vec![
                Call::Launch(command),
                Call::Open("https://www.roblox.com/".to_string())
            ]
        );
        assert_eq!(state.reconnect_attempts, 1);
        assert_eq!(state.last_disconnection_time, 5000.0);
    }
}
