//! Host specific locations of the game directory.
use std::{
    env,
    path::{Path, PathBuf},
};

/// Where a host keeps its game files.
pub trait Platform {
    fn name(&self) -> &'static str;

    fn game_directory(&self) -> PathBuf;

    fn assets_directory(&self) -> PathBuf {
        self.game_directory().join("assets")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Linux;

#[derive(Debug, Default, Clone, Copy)]
pub struct MacOs;

#[derive(Debug, Default, Clone, Copy)]
pub struct Windows;

fn env_dir(key: &str) -> PathBuf {
    env::var_os(key).map_or_else(|| Path::new(".").to_path_buf(), PathBuf::from)
}

impl Platform for Linux {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn game_directory(&self) -> PathBuf {
        env_dir("HOME").join(".minecraft")
    }
}

impl Platform for MacOs {
    fn name(&self) -> &'static str {
        "osx"
    }

    fn game_directory(&self) -> PathBuf {
        env_dir("HOME")
            .join("Library")
            .join("Application Support")
            .join("minecraft")
    }
}

impl Platform for Windows {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn game_directory(&self) -> PathBuf {
        env_dir("APPDATA").join(".minecraft")
    }
}

/// Returns the platform this binary was built for.
/// # Examples
/// ```
/// use launcher::platform;
/// let platform = platform::current();
/// assert!(platform.assets_directory().starts_with(platform.game_directory()));
/// ```
#[must_use]
pub fn current() -> Box<dyn Platform> {
    if cfg!(target_os = "windows") {
        Box::new(Windows)
    } else if cfg!(target_os = "macos") {
        Box::new(MacOs)
    } else {
        Box::new(Linux)
    }
}

#[test]
fn test_assets_under_game_directory() {
    for platform in [
        Box::new(Linux) as Box<dyn Platform>,
        Box::new(MacOs),
        Box::new(Windows),
    ] {
        let game = platform.game_directory();
        assert_eq!(platform.assets_directory(), game.join("assets"));
        assert!(game.ends_with(".minecraft") || game.ends_with("minecraft"));
    }
    assert_eq!(
        [Linux.name(), MacOs.name(), Windows.name()],
        ["linux", "osx", "windows"]
    );
    assert!(["linux", "osx", "windows"].contains(&current().name()));
}
