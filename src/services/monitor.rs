use crate::config::Config;
use crate::events::{MonitorEvent, StopReason};
use crate::services::detector::DisconnectionDetector;
use crate::services::notifier::{send_notification, Notifier};
use crate::services::reconnector::Reconnector;
use crate::services::state::MonitorState;
use crate::utils::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Остановка мониторинга из другого потока. Кооперативная: флаг
/// проверяется в начале каждой итерации.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Остановка мониторинга...");
        }
    }
}

/// Цикл мониторинга: детектор + переподключатель с фиксированным интервалом опроса
pub struct Monitor {
    config: Arc<Config>,
    detector: DisconnectionDetector,
    reconnector: Reconnector,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: MonitorState,
    running: Arc<AtomicBool>,
    events: Option<mpsc::Sender<MonitorEvent>>,
}

impl Monitor {
    pub fn new(
        config: Arc<Config>,
        detector: DisconnectionDetector,
        reconnector: Reconnector,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            detector,
            reconnector,
            notifier,
            clock,
            state: MonitorState::default(),
            running: Arc::new(AtomicBool::new(false)),
            events: None,
        }
    }

    /// Канал статусов для фронтенда
    pub fn with_events(mut self, events: mpsc::Sender<MonitorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: self.running.clone(),
        }
    }

    /// Состояние последней сессии (только для чтения)
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Статус отправляется без ожидания: при переполненном канале сообщение теряется
    fn publish(&self, event: MonitorEvent) {
        if let Some(events) = &self.events {
            if let Err(e) = events.try_send(event) {
                debug!("Статус не доставлен фронтенду: {}", e);
            }
        }
    }

    async fn notify(&self, message: &str) {
        send_notification(
            &self.config,
            self.notifier.as_ref(),
            &self.config.notifications.app_name,
            message,
        )
        .await;
    }

    /// Запустить сессию мониторинга. Возвращается после stop() или исчерпания попыток.
    pub async fn start(&mut self, target_url: Option<String>) -> StopReason {
        self.state = MonitorState::new(target_url.clone());
        self.state.monitoring = true;
        self.running.store(true, Ordering::SeqCst);

        info!("Запуск мониторинга отключений...");
        if let Some(url) = &target_url {
            info!("Отслеживаемый приватный сервер: {}", url);
        }

        self.notify("Monitoring started").await;
        self.publish(MonitorEvent::Started { target_url });

        let reason = self.run_cycle().await;

        self.state.monitoring = false;
        self.running.store(false, Ordering::SeqCst);
        info!("Мониторинг остановлен: {}", reason);
        self.publish(MonitorEvent::Stopped { reason });

        reason
    }

    async fn run_cycle(&mut self) -> StopReason {
        let max_attempts = self.config.monitor.max_reconnect_attempts;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return StopReason::Requested;
            }

            let now = self.clock.now();
            if !self.detector.detect(&mut self.state, now).await {
                sleep(self.config.check_interval()).await;
                continue;
            }

            warn!("Обнаружено отключение!");
            self.notify("Disconnection detected! Attempting to reconnect...").await;
            self.publish(MonitorEvent::Disconnected {
                consecutive: self.state.consecutive_disconnects,
            });

            if self.state.reconnect_attempts >= max_attempts {
                error!("Достигнут лимит попыток переподключения ({})", max_attempts);
                self.notify("Max reconnection attempts reached. Stopping monitoring.").await;
                self.publish(MonitorEvent::AttemptsExhausted { max: max_attempts });
                return StopReason::AttemptsExhausted;
            }

            let success = self.reconnector.reconnect(&mut self.state).await;
            if success {
                info!("Попытка переподключения завершена");
            } else {
                error!("Попытка переподключения не удалась");
            }
            self.publish(MonitorEvent::ReconnectAttempt {
                attempt: self.state.reconnect_attempts,
                max: max_attempts,
                success,
            });

            sleep(self.config.reconnect_delay()).await;
        }
    }
}
