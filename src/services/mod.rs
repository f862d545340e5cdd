pub mod clipboard;
pub mod detector;
pub mod launcher;
pub mod link;
pub mod monitor;
pub mod notifier;
pub mod probe;
pub mod reconnector;
pub mod state;

pub use monitor::Monitor;
pub use probe::create_probe;

use crate::config::Config;
use crate::error::Result;
use crate::utils::{Clock, SystemClock};
use clipboard::SystemClipboard;
use detector::DisconnectionDetector;
use launcher::{DryRunLauncher, Launcher, SystemLauncher};
use notifier::{DesktopNotifier, DryRunNotifier, Notifier};
use reconnector::Reconnector;
use std::sync::Arc;
use tracing::info;

/// Собрать цикл мониторинга с реальными или эмулируемыми (dry_run) сервисами
pub fn create_monitor(config: Arc<Config>, dry_run: bool) -> Result<Monitor> {
    info!("Инициализация компонентов мониторинга (dry_run: {})", dry_run);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let probe = create_probe(config.clone(), dry_run)?;

    let (launcher, notifier): (Arc<dyn Launcher>, Arc<dyn Notifier>) = if dry_run {
        (Arc::new(DryRunLauncher), Arc::new(DryRunNotifier))
    } else {
        (
            Arc::new(SystemLauncher::new()),
            Arc::new(DesktopNotifier::new(config.clone())),
        )
    };

    let detector = DisconnectionDetector::new(config.clone(), probe);
    let reconnector = Reconnector::new(
        config.clone(),
        Arc::new(SystemClipboard::new()),
        launcher,
        clock.clone(),
    );

    Ok(Monitor::new(config, detector, reconnector, notifier, clock))
}
