use crate::antileave_error;
use crate::error::{AntiLeaveError, Result};
use crate::events::WindowHandle;
use serde_json::Value;
use std::process::Command;

pub struct SwayLister;

impl SwayLister {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("swaymsg").args(["-t", "get_tree"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AntiLeaveError::Probe("sway failed".to_string()))
        }
    }

    pub async fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        let output = Command::new("swaymsg")
            .args(["-t", "get_tree"])
            .output()
            .map_err(|e| antileave_error!(probe, "swaymsg не найден: {}", e))?;

        if !output.status.success() {
            return Err(AntiLeaveError::Probe("swaymsg вернул ошибку".to_string()));
        }

        let tree: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| antileave_error!(probe, "Некорректный JSON от swaymsg: {}", e))?;

        let mut windows = Vec::new();
        collect_windows(&tree, &mut windows);
        Ok(windows)
    }
}

/// Обход дерева sway: окна - это узлы con/floating_con с pid
fn collect_windows(node: &Value, windows: &mut Vec<WindowHandle>) {
    let is_window = matches!(node["type"].as_str(), Some("con") | Some("floating_con"))
        && node.get("pid").is_some();

    if is_window {
        if let Some(title) = node["name"].as_str().filter(|t| !t.is_empty()) {
            let id = node["id"].as_u64().map(|id| id.to_string()).unwrap_or_default();
            windows.push(WindowHandle::new(title, id));
        }
    }

    for key in ["nodes", "floating_nodes"] {
        if let Some(children) = node[key].as_array() {
            for child in children {
                collect_windows(child, windows);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_tiled_and_floating_windows() {
        let tree = serde_json::json!({
            "id": 1, "type": "root", "name": "root",
            "nodes": [{
                "id": 2, "type": "output", "name": "eDP-1",
                "nodes": [{
                    "id": 3, "type": "workspace", "name": "1",
                    "nodes": [{ "id": 10, "type": "con", "name": "Roblox", "pid": 4242, "nodes": [] }],
                    "floating_nodes": [{ "id": 11, "type": "floating_con", "name": "Sober", "pid": 4243 }]
                }]
            }]
        });

        let mut windows = Vec::new();
        collect_windows(&tree, &mut windows);

        assert_eq!(
            windows,
            vec![WindowHandle::new("Roblox", "10"), WindowHandle::new("Sober", "11")]
        );
    }
}
