//! Game data directory detection.
//!
//! The client keeps its downloaded assets under a per-user data directory:
//! - **Windows**: `%UserProfile%\AppData\LocalLow\Cygames\umamusume`
//! - **Linux (Proton/Wine)**: the same tree inside the prefix's
//!   `users/steamuser` (or `users/<name>`) directory
//!
//! The directory contains the `dat/` bundle tree, the `meta` index, and
//! `master/master.mdb`.

use std::path::{Path, PathBuf};

/// Steam app id of the global release, used to locate the Proton prefix
const STEAM_APP_ID: &str = "3224770";

/// Resolved game data layout
#[derive(Debug, Clone)]
pub struct GameDirs {
    root: PathBuf,
}

impl GameDirs {
    /// Use an explicit game data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GameDirs { root: root.into() }
    }

    /// Detect the default game data directory for the current platform.
    ///
    /// Returns the first existing candidate, or `None` if no standard
    /// location exists.
    pub fn detect() -> Option<Self> {
        detect_data_directory().map(|root| GameDirs { root })
    }

    /// The game data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of a hash-named bundle file (`dat/<hh>/<hash>`)
    pub fn bundle_path(&self, bundle_hash: &str) -> PathBuf {
        let shard = &bundle_hash[..bundle_hash.len().min(2)];
        self.root.join("dat").join(shard).join(bundle_hash)
    }

    /// Path of the metadata index database
    pub fn meta_path(&self) -> PathBuf {
        self.root.join("meta")
    }

    /// Path of the master game database
    pub fn master_path(&self) -> PathBuf {
        self.root.join("master").join("master.mdb")
    }
}

fn detect_data_directory() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        detect_windows_data_directory()
    }

    #[cfg(target_os = "linux")]
    {
        detect_linux_data_directory()
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "windows")]
fn detect_windows_data_directory() -> Option<PathBuf> {
    let userprofile = std::env::var("USERPROFILE").ok()?;
    let root = PathBuf::from(userprofile)
        .join("AppData")
        .join("LocalLow")
        .join("Cygames")
        .join("umamusume");

    root.is_dir().then_some(root)
}

#[cfg(target_os = "linux")]
fn detect_linux_data_directory() -> Option<PathBuf> {
    let suffix = PathBuf::from("AppData")
        .join("LocalLow")
        .join("Cygames")
        .join("umamusume");

    let proton_users = format!(
        "steamapps/compatdata/{}/pfx/drive_c/users",
        STEAM_APP_ID
    );

    let mut candidates = Vec::new();

    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        candidates.push(PathBuf::from(xdg_data).join("Steam").join(&proton_users));
    }

    if let Ok(home) = std::env::var("HOME") {
        candidates.push(
            PathBuf::from(&home)
                .join(".local")
                .join("share")
                .join("Steam")
                .join(&proton_users),
        );
        candidates.push(
            PathBuf::from(&home)
                .join(".steam")
                .join("steam")
                .join(&proton_users),
        );
        // Plain Wine prefix
        candidates.push(PathBuf::from(&home).join(".wine").join("drive_c").join("users"));
    }

    for users_dir in candidates {
        if let Some(root) = find_data_in_users_dir(&users_dir, &suffix) {
            return Some(root);
        }
    }

    None
}

#[cfg(target_os = "linux")]
fn find_data_in_users_dir(users_dir: &Path, suffix: &Path) -> Option<PathBuf> {
    if !users_dir.is_dir() {
        return None;
    }

    for entry in std::fs::read_dir(users_dir).ok()? {
        let entry = entry.ok()?;
        let candidate = entry.path().join(suffix);
        if candidate.is_dir() {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_path_sharding() {
        let game = GameDirs::new("/data/umamusume");
        assert_eq!(
            game.bundle_path("ab12cd34ef"),
            PathBuf::from("/data/umamusume/dat/ab/ab12cd34ef")
        );
    }

    #[test]
    fn test_db_paths() {
        let game = GameDirs::new("/data/umamusume");
        assert_eq!(game.meta_path(), PathBuf::from("/data/umamusume/meta"));
        assert_eq!(
            game.master_path(),
            PathBuf::from("/data/umamusume/master/master.mdb")
        );
    }
}
