use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub monitor: MonitorConfig,
    pub detection: DetectionConfig,
    pub notifications: NotificationConfig,
    pub reconnect: ReconnectConfig,
    // Оптимизационные индексы - не сериализуются, строятся после загрузки
    #[serde(skip)]
    title_regexes: Vec<Regex>, // Скомпилированные паттерны заголовков
    #[serde(skip)]
    process_names_lower: Vec<String>,
    #[serde(skip)]
    indicators_lower: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub check_interval_secs: u64,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_secs: u64,
    pub disconnection_cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    pub indicators: Vec<String>,
    pub window_title_patterns: Vec<String>,
    pub process_names: Vec<String>,
    pub enable_process_monitoring: bool,
    pub enable_window_monitoring: bool,
    pub enable_clipboard_detection: bool,
    pub window_method: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub app_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectConfig {
    pub browser_wait_secs: u64,
    pub launch_command: Vec<String>,
    pub fallback_url: String,
}

/// Команда прямого запуска клиента для текущей платформы
fn default_launch_command() -> Vec<String> {
    if cfg!(target_os = "windows") {
        strings(&["cmd", "/C", "start", "", "roblox:"])
    } else if cfg!(target_os = "macos") {
        strings(&["open", "roblox://"])
    } else {
        strings(&["xdg-open", "roblox://"])
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
                file: Some("antileave.log".to_string()),
                console: true,
            },
            monitor: MonitorConfig {
                check_interval_secs: 5,
                max_reconnect_attempts: 3,
                reconnect_delay_secs: 10,
                disconnection_cooldown_secs: 30,
            },
            detection: DetectionConfig {
                indicators: strings(&[
                    "disconnected",
                    "connection lost",
                    "unable to connect",
                    "kicked",
                    "error",
                    "reconnect",
                    "lost connection",
                    "connection failed",
                    "network error",
                    "timeout",
                ]),
                window_title_patterns: strings(&[
                    "Roblox",
                    ".*- Roblox",
                    "Roblox Player",
                    "RobloxPlayerBeta",
                ]),
                process_names: strings(&[
                    "robloxplayerbeta.exe",
                    "roblox.exe",
                    "robloxplayer.exe",
                    "sober",
                ]),
                enable_process_monitoring: true,
                enable_window_monitoring: true,
                enable_clipboard_detection: true,
                window_method: "auto".to_string(),
            },
            notifications: NotificationConfig {
                enabled: true,
                timeout_secs: 10,
                app_name: "Roblox Anti-Leave".to_string(),
            },
            reconnect: ReconnectConfig {
                browser_wait_secs: 3,
                launch_command: default_launch_command(),
                fallback_url: "https://www.roblox.com/".to_string(),
            },
            title_regexes: Vec::new(),
            process_names_lower: Vec::new(),
            indicators_lower: Vec::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ANTILEAVE_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Загрузка с откатом на встроенные значения. Ошибка возвращается вызывающему,
    /// чтобы её можно было залогировать после инициализации tracing.
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> (Self, Option<anyhow::Error>) {
        match Self::load(config_path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Строит оптимизационные индексы для быстрого поиска
    pub fn build_optimization_indexes(&mut self) {
        // Невалидные паттерны отсекаются в validate()
        self.title_regexes = self
            .detection
            .window_title_patterns
            .iter()
            .filter_map(|pattern| compile_title_pattern(pattern).ok())
            .collect();

        self.process_names_lower = self
            .detection
            .process_names
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        self.indicators_lower = self
            .detection
            .indicators
            .iter()
            .map(|indicator| indicator.to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "pretty" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек мониторинга
        if self.monitor.check_interval_secs == 0 {
            anyhow::bail!("check_interval_secs должно быть больше 0");
        }

        if self.monitor.max_reconnect_attempts == 0 {
            anyhow::bail!("max_reconnect_attempts должно быть больше 0");
        }

        // Валидация настроек детекции
        match self.detection.window_method.as_str() {
            "auto" | "kdotool" | "xdotool" | "wmctrl" | "sway" | "powershell" | "osascript" => {}
            _ => anyhow::bail!(
                "Неверный метод получения списка окон: {}",
                self.detection.window_method
            ),
        }

        for (i, pattern) in self.detection.window_title_patterns.iter().enumerate() {
            compile_title_pattern(pattern)
                .with_context(|| format!("Неверный паттерн заголовка #{}: '{}'", i + 1, pattern))?;
        }

        if self.detection.enable_process_monitoring && self.detection.process_names.is_empty() {
            anyhow::bail!("Список process_names пуст при включённом мониторинге процессов");
        }

        // Валидация настроек переподключения
        if self.reconnect.launch_command.is_empty() {
            anyhow::bail!("launch_command не может быть пустым");
        }

        if !self.reconnect.fallback_url.starts_with("http://")
            && !self.reconnect.fallback_url.starts_with("https://")
        {
            anyhow::bail!("fallback_url должен начинаться с http:// или https://");
        }

        Ok(())
    }

    /// Заголовок совпадает хотя бы с одним паттерном (регистронезависимо)
    pub fn title_matches(&self, title: &str) -> bool {
        self.title_regexes.iter().any(|re| re.is_match(title))
    }

    /// Имя процесса содержит один из настроенных фрагментов (регистронезависимо)
    pub fn is_target_process_name(&self, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        self.process_names_lower
            .iter()
            .any(|fragment| name_lower.contains(fragment.as_str()))
    }

    /// Первый "мягкий" индикатор, найденный в заголовке
    pub fn find_indicator(&self, title_lower: &str) -> Option<&str> {
        self.indicators_lower
            .iter()
            .find(|indicator| title_lower.contains(indicator.as_str()))
            .map(String::as_str)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.check_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.monitor.reconnect_delay_secs)
    }

    pub fn browser_wait(&self) -> Duration {
        Duration::from_secs(self.reconnect.browser_wait_secs)
    }

    pub fn cooldown_secs(&self) -> f64 {
        self.monitor.disconnection_cooldown_secs as f64
    }
}

fn compile_title_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
