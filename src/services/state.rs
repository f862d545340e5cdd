/// Состояние одной сессии мониторинга. Принадлежит циклу мониторинга;
/// детектор и переподключатель получают его по ссылке.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    pub monitoring: bool,
    pub reconnect_attempts: u32,
    /// Настенное время в секундах с начала эпохи UNIX
    pub last_disconnection_time: f64,
    pub was_connected: bool,
    pub consecutive_disconnects: u32,
    pub target_url: Option<String>,
}

impl MonitorState {
    /// Новая сессия: клиент считается подключённым
    pub fn new(target_url: Option<String>) -> Self {
        Self {
            monitoring: false,
            reconnect_attempts: 0,
            last_disconnection_time: 0.0,
            was_connected: true,
            consecutive_disconnects: 0,
            target_url,
        }
    }

    /// Зафиксировать отключение в момент `now`
    pub fn mark_disconnected(&mut self, now: f64) {
        self.was_connected = false;
        self.last_disconnection_time = self.last_disconnection_time.max(now);
        self.consecutive_disconnects += 1;
    }

    pub fn mark_connected(&mut self) {
        self.was_connected = true;
        self.consecutive_disconnects = 0;
    }

    pub fn in_cooldown(&self, now: f64, cooldown_secs: f64) -> bool {
        now - self.last_disconnection_time < cooldown_secs
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_optimistic() {
        let state = MonitorState::new(Some("https://www.roblox.com/share?code=1&type=Server".into()));
        assert!(state.was_connected);
        assert_eq!(state.reconnect_attempts, 0);
        assert_eq!(state.last_disconnection_time, 0.0);
        assert!(!state.monitoring);
    }

    #[test]
    fn disconnection_time_never_goes_back() {
        let mut state = MonitorState::default();
        state.mark_disconnected(100.0);
        state.mark_disconnected(90.0);
        assert_eq!(state.last_disconnection_time, 100.0);
        assert_eq!(state.consecutive_disconnects, 2);

        state.mark_connected();
        assert!(state.was_connected);
        assert_eq!(state.consecutive_disconnects, 0);
    }

    #[test]
    fn cooldown_window() {
        let mut state = MonitorState::default();
        state.mark_disconnected(1000.0);
        assert!(state.in_cooldown(1010.0, 30.0));
        assert!(!state.in_cooldown(1030.0, 30.0));
    }
}
