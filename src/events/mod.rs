pub mod monitor;
pub mod window;

pub use monitor::{MonitorEvent, StopReason};
pub use window::{EnvironmentSnapshot, WindowHandle};
