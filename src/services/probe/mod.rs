//! EnvironmentProbe service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for answering two questions
//! about the desktop: is the target process running, and which top-level windows
//! match the configured title patterns. It MUST NOT decide whether a disconnection
//! happened; that belongs to DisconnectionDetector.

mod dry_run;
mod kdotool;
mod osascript;
mod powershell;
mod process;
mod sway;
mod system_probe;
mod window_lister;
mod wmctrl;
mod xdotool;
mod r#trait;

pub use self::r#trait::{create_probe, EnvironmentProbe};
