use std::fmt;

/// Причина завершения цикла мониторинга
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Остановлен по запросу (stop())
    Requested,
    /// Исчерпан лимит попыток переподключения
    AttemptsExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => write!(f, "остановлен пользователем"),
            StopReason::AttemptsExhausted => write!(f, "исчерпан лимит попыток"),
        }
    }
}

/// Сообщение о статусе от воркера мониторинга к фронтенду
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Started { target_url: Option<String> },
    Disconnected { consecutive: u32 },
    ReconnectAttempt { attempt: u32, max: u32, success: bool },
    AttemptsExhausted { max: u32 },
    Stopped { reason: StopReason },
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Started { target_url: Some(url) } => {
                write!(f, "Мониторинг активен: {}", url)
            }
            MonitorEvent::Started { target_url: None } => {
                write!(f, "Мониторинг активен (без ссылки на сервер)")
            }
            MonitorEvent::Disconnected { consecutive } => {
                write!(f, "Обнаружено отключение (подряд: {})", consecutive)
            }
            MonitorEvent::ReconnectAttempt { attempt, max, success } => {
                let outcome = if *success { "выполнена" } else { "не удалась" };
                write!(f, "Попытка переподключения {}/{} {}", attempt, max, outcome)
            }
            MonitorEvent::AttemptsExhausted { max } => {
                write!(f, "Достигнут лимит попыток переподключения ({})", max)
            }
            MonitorEvent::Stopped { reason } => write!(f, "Мониторинг остановлен: {}", reason),
        }
    }
}
