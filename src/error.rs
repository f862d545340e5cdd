use thiserror::Error;

#[derive(Error, Debug)]
pub enum AntiLeaveError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка опроса окружения: {0}")]
    Probe(String),

    #[error("Ошибка запуска: {0}")]
    Launch(String),

    #[error("Буфер обмена недоступен: {0}")]
    Clipboard(String),

    #[error("Ошибка уведомления: {0}")]
    Notification(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

impl AntiLeaveError {
    pub fn probe<T>(msg: impl Into<String>) -> Result<T> {
        Err(AntiLeaveError::Probe(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, AntiLeaveError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! antileave_error {
    (probe, $($arg:tt)*) => {
        $crate::error::AntiLeaveError::Probe(format!($($arg)*))
    };
    (launch, $($arg:tt)*) => {
        $crate::error::AntiLeaveError::Launch(format!($($arg)*))
    };
    (notification, $($arg:tt)*) => {
        $crate::error::AntiLeaveError::Notification(format!($($arg)*))
    };
}
