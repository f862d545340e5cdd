use crate::config::Config;
use crate::debug_if_enabled;
use crate::events::WindowHandle;
use crate::services::probe::EnvironmentProbe;
use crate::services::state::MonitorState;
use std::sync::Arc;
use tracing::{error, info};

/// Заголовок явно сообщает об отключении. Список намеренно не настраивается:
/// общие индикаторы из конфигурации дают ложные срабатывания.
fn has_strong_indicator(title_lower: &str) -> bool {
    title_lower.contains("disconnected")
        || (title_lower.contains("kicked") && title_lower.contains("afk"))
        || title_lower.contains("session expired")
}

/// Детектор отключений: конечный автомат поверх снимков окружения
/// с периодом охлаждения между событиями.
pub struct DisconnectionDetector {
    config: Arc<Config>,
    probe: Arc<dyn EnvironmentProbe>,
}

impl DisconnectionDetector {
    pub fn new(config: Arc<Config>, probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self { config, probe }
    }

    /// Один тик детекции в момент `now`. Возвращает true, если произошло отключение.
    pub async fn detect(&self, state: &mut MonitorState, now: f64) -> bool {
        if state.in_cooldown(now, self.config.cooldown_secs()) {
            debug_if_enabled!("Детекция пропущена: период охлаждения");
            return false;
        }

        let detection = &self.config.detection;

        let process_running = if detection.enable_process_monitoring {
            match self.probe.process_running().await {
                Ok(running) => running,
                Err(e) => {
                    error!("Ошибка проверки процесса клиента: {}", e);
                    return false;
                }
            }
        } else {
            true
        };

        // Без процесса список окон ничего не меняет: клиент считается отключённым
        let windows = if detection.enable_window_monitoring && process_running {
            match self.probe.target_windows().await {
                Ok(windows) => windows,
                Err(e) => {
                    error!("Ошибка получения окон клиента: {}", e);
                    return false;
                }
            }
        } else {
            Vec::new()
        };

        let currently_connected =
            process_running && (!detection.enable_window_monitoring || !windows.is_empty());

        debug_if_enabled!(
            "Тик: процесс={}, окон={}, подключён={}, был подключён={}",
            process_running,
            windows.len(),
            currently_connected,
            state.was_connected
        );

        if state.was_connected && !currently_connected {
            info!("Обнаружено отключение: клиент был запущен, но теперь закрыт");
            state.mark_disconnected(now);
            return true;
        }

        if currently_connected {
            state.mark_connected();
        }

        if currently_connected && detection.enable_window_monitoring {
            if let Some(window) = self.find_disconnection_popup(&windows) {
                info!("Сообщение об отключении в окне клиента: {}", window);
                state.mark_disconnected(now);
                return true;
            }
        }

        false
    }

    fn find_disconnection_popup<'a>(&self, windows: &'a [WindowHandle]) -> Option<&'a WindowHandle> {
        windows.iter().find(|window| {
            let title_lower = window.title_lower();
            if has_strong_indicator(&title_lower) {
                return true;
            }
            if let Some(indicator) = self.config.find_indicator(&title_lower) {
                debug_if_enabled!(
                    "Окно {} содержит индикатор '{}', но он недостаточно надёжен",
                    window,
                    indicator
                );
            }
            false
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{AntiLeaveError, Result};
    use crate::events::EnvironmentSnapshot;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Проба с заранее заданной последовательностью снимков.
    /// Снимок сменяется раз в тик (на первом вызове пробы); последний повторяется.
    pub(crate) struct ScriptedProbe {
        script: Mutex<VecDeque<Option<EnvironmentSnapshot>>>,
        current: Mutex<Option<EnvironmentSnapshot>>,
        windows_driven: bool,
    }

    impl ScriptedProbe {
        pub(crate) fn new(script: Vec<EnvironmentSnapshot>) -> Self {
            Self::with_failures(script.into_iter().map(Some).collect())
        }

        /// `None` в сценарии означает сбой перечисления на этом тике
        pub(crate) fn with_failures(script: Vec<Option<EnvironmentSnapshot>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                current: Mutex::new(None),
                windows_driven: false,
            }
        }

        /// Для конфигураций без мониторинга процессов
        pub(crate) fn windows_driven(script: Vec<EnvironmentSnapshot>) -> Self {
            Self {
                windows_driven: true,
                ..Self::new(script)
            }
        }

        fn advance(&self) -> Option<EnvironmentSnapshot> {
            let mut script = self.script.lock();
            let next = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().cloned().flatten()
            };
            *self.current.lock() = next.clone();
            next
        }
    }

    #[async_trait::async_trait]
    impl EnvironmentProbe for ScriptedProbe {
        async fn process_running(&self) -> Result<bool> {
            match self.advance() {
                Some(snapshot) => Ok(snapshot.process_running),
                None => AntiLeaveError::probe("сбой перечисления процессов"),
            }
        }

        async fn target_windows(&self) -> Result<Vec<WindowHandle>> {
            let snapshot = if self.windows_driven {
                self.advance()
            } else {
                self.current.lock().clone()
            };
            match snapshot {
                Some(snapshot) => Ok(snapshot.windows),
                None => AntiLeaveError::probe("сбой перечисления окон"),
            }
        }
    }

    fn popup(title: &str) -> EnvironmentSnapshot {
        EnvironmentSnapshot::new(true, vec![WindowHandle::new(title, "0x1")])
    }

    fn detector(config: Config, script: Vec<EnvironmentSnapshot>) -> DisconnectionDetector {
        DisconnectionDetector::new(Arc::new(config), Arc::new(ScriptedProbe::new(script)))
    }

    #[test]
    fn strong_indicators() {
        assert!(has_strong_indicator("roblox - disconnected"));
        assert!(has_strong_indicator("kicked: you were afk for 20 minutes"));
        assert!(has_strong_indicator("session expired"));
        assert!(!has_strong_indicator("kicked by server"));
        assert!(!has_strong_indicator("roblox - network error"));
    }

    #[tokio::test]
    async fn edge_triggered_detection() {
        let detector = detector(
            Config::default(),
            vec![
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::disconnected(),
                EnvironmentSnapshot::disconnected(),
                EnvironmentSnapshot::connected(),
            ],
        );
        let mut state = MonitorState::new(None);

        // Тики с шагом больше периода охлаждения
        let mut events = Vec::new();
        for tick in 0..5 {
            events.push(detector.detect(&mut state, 1000.0 + 100.0 * tick as f64).await);
        }

        assert_eq!(events, vec![false, false, true, false, false]);
        assert!(state.was_connected);
        assert_eq!(state.consecutive_disconnects, 0);
        assert_eq!(state.last_disconnection_time, 1200.0);
    }

    #[tokio::test]
    async fn cooldown_suppresses_second_disconnection() {
        let mut config = Config::default();
        config.monitor.disconnection_cooldown_secs = 30;
        let detector = detector(
            config,
            vec![
                EnvironmentSnapshot::disconnected(),
                EnvironmentSnapshot::connected(),
                EnvironmentSnapshot::disconnected(),
            ],
        );
        let mut state = MonitorState::new(None);

        assert!(detector.detect(&mut state, 1000.0).await);
        // Внутри окна охлаждения проба даже не опрашивается
        assert!(!detector.detect(&mut state, 1005.0).await);
        assert!(!detector.detect(&mut state, 1010.0).await);
        assert_eq!(state.consecutive_disconnects, 1);
        assert_eq!(state.last_disconnection_time, 1000.0);
    }

    #[tokio::test]
    async fn popup_title_triggers_event_while_connected() {
        let detector = detector(Config::default(), vec![popup("Roblox - Disconnected")]);
        let mut state = MonitorState::new(None);

        assert!(detector.detect(&mut state, 1000.0).await);
        assert!(!state.was_connected);
        assert_eq!(state.consecutive_disconnects, 1);
    }

    #[tokio::test]
    async fn soft_indicator_does_not_trigger() {
        let detector = detector(Config::default(), vec![popup("Roblox - Network Error")]);
        let mut state = MonitorState::new(None);

        assert!(!detector.detect(&mut state, 1000.0).await);
        assert!(state.was_connected);
    }

    #[tokio::test]
    async fn window_monitoring_disabled_uses_process_only() {
        let mut config = Config::default();
        config.detection.enable_window_monitoring = false;
        let detector = detector(
            config,
            vec![
                EnvironmentSnapshot::new(true, Vec::new()),
                EnvironmentSnapshot::new(false, Vec::new()),
            ],
        );
        let mut state = MonitorState::new(None);

        assert!(!detector.detect(&mut state, 1000.0).await);
        assert!(detector.detect(&mut state, 1100.0).await);
    }

    #[tokio::test]
    async fn process_monitoring_disabled_uses_windows_only() {
        let mut config = Config::default();
        config.detection.enable_process_monitoring = false;
        let probe = ScriptedProbe::windows_driven(vec![
            EnvironmentSnapshot::new(false, vec![WindowHandle::new("Roblox", "1")]),
            EnvironmentSnapshot::new(false, Vec::new()),
        ]);
        let detector = DisconnectionDetector::new(Arc::new(config), Arc::new(probe));
        let mut state = MonitorState::new(None);

        // Флаг процесса из снимка игнорируется: окно на месте - клиент подключён
        assert!(!detector.detect(&mut state, 1000.0).await);
        assert!(state.was_connected);
        assert!(detector.detect(&mut state, 1100.0).await);
    }

    #[tokio::test]
    async fn enumeration_failure_yields_no_event() {
        let probe = ScriptedProbe::with_failures(vec![
            Some(EnvironmentSnapshot::connected()),
            None,
            Some(EnvironmentSnapshot::disconnected()),
        ]);
        let detector = DisconnectionDetector::new(Arc::new(Config::default()), Arc::new(probe));
        let mut state = MonitorState::new(None);

        assert!(!detector.detect(&mut state, 1000.0).await);
        assert!(!detector.detect(&mut state, 1100.0).await);
        assert!(state.was_connected);
        assert!(detector.detect(&mut state, 1200.0).await);
    }

    /// Процесс задаётся сценарием, перечисление окон всегда падает
    struct WindowsUnavailable {
        running: Mutex<VecDeque<bool>>,
    }

    #[async_trait::async_trait]
    impl EnvironmentProbe for WindowsUnavailable {
        async fn process_running(&self) -> Result<bool> {
            let mut running = self.running.lock();
            let next = if running.len() > 1 { running.pop_front() } else { running.front().copied() };
            Ok(next.unwrap_or(false))
        }

        async fn target_windows(&self) -> Result<Vec<WindowHandle>> {
            AntiLeaveError::probe("нет утилиты для перечисления окон")
        }
    }

    #[tokio::test]
    async fn process_exit_detected_while_window_listing_fails() {
        let lister = WindowsUnavailable {
            running: Mutex::new(VecDeque::from(vec![true, false])),
        };
        let detector = DisconnectionDetector::new(Arc::new(Config::default()), Arc::new(lister));
        let mut state = MonitorState::new(None);

        // Процесс жив, окна недоступны: тик пропускается
        assert!(!detector.detect(&mut state, 1000.0).await);
        assert!(state.was_connected);

        // Процесс пропал: событие ровно одно, несмотря на сбой окон
        let mut events = 0;
        for tick in 1..10 {
            if detector.detect(&mut state, 1000.0 + 100.0 * tick as f64).await {
                events += 1;
            }
        }
        assert_eq!(events, 1);
        assert!(!state.was_connected);
        assert_eq!(state.consecutive_disconnects, 1);
    }
}
