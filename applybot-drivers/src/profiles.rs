//! Discovery of locally available Chrome profiles.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A Chrome profile directory, e.g. `Default` or `Profile 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromeProfile {
    pub name: String,
    pub path: PathBuf,
}

/// Chrome's user data directory for the current platform, if resolvable.
pub fn chrome_user_data_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("Google").join("Chrome").join("User Data"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("Google").join("Chrome"))
    } else {
        dirs::config_dir().map(|d| d.join("google-chrome"))
    }
}

fn is_profile_dir(name: &str) -> bool {
    name == "Default" || name.starts_with("Profile")
}

/// `Default` first, then `Profile N` in numeric order.
fn sort_key(name: &str) -> (bool, u32, String) {
    let number = name
        .strip_prefix("Profile")
        .and_then(|rest| rest.trim().parse().ok())
        .unwrap_or(u32::MAX);
    (name != "Default", number, name.to_string())
}

/// List the profile directories below `root`.
pub fn discover_profiles(root: &Path) -> std::io::Result<Vec<ChromeProfile>> {
    let mut profiles = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_profile_dir(&name) {
            profiles.push(ChromeProfile {
                path: entry.path(),
                name,
            });
        }
    }
    profiles.sort_by_key(|p| sort_key(&p.name));
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn lists_default_then_numbered_profiles() {
        let root = tempfile::tempdir().unwrap();
        for dir in ["Profile 10", "Crashpad", "Profile 2", "Default", "System Profile"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        fs::write(root.path().join("Profile 3"), b"not a directory").unwrap();

        let profiles = discover_profiles(root.path()).unwrap();
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Default", "Profile 2", "Profile 10"]);
        assert_eq!(profiles[0].path, root.path().join("Default"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover_profiles(&root.path().join("absent")).is_err());
    }
}
