//! Discovered Applications Store
//!
//! The executable scanner persists a `{clean_name: path}` map; at startup
//! the discovered names are folded into the system instruction so the model
//! knows which applications it can ask to open.

use std::collections::BTreeMap;
use std::path::Path;

/// Where the scanner persists its findings, relative to the working directory.
pub const DISCOVERED_APPS_FILE: &str = "discovered_apps.json";

/// Load discovered application names for the system instruction hint.
/// A missing or unreadable file simply yields no hint.
pub fn load_discovered_apps() -> Vec<String> {
    load_discovered_apps_from(Path::new(DISCOVERED_APPS_FILE))
}

pub fn load_discovered_apps_from(path: &Path) -> Vec<String> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Vec::new();
    };

    match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
        Ok(apps) => apps.into_keys().collect(),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "ignoring malformed app index");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_no_apps() {
        let apps = load_discovered_apps_from(Path::new("/definitely/not/here.json"));
        assert!(apps.is_empty());
    }

    #[test]
    fn names_are_loaded_from_the_index() {
        let dir = std::env::temp_dir().join(format!("valet-apps-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("apps.json");
        std::fs::write(&path, r#"{"chrome": "/usr/bin/chrome", "code": "/usr/bin/code"}"#)
            .unwrap();

        let apps = load_discovered_apps_from(&path);
        assert_eq!(apps, vec!["chrome".to_string(), "code".to_string()]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
