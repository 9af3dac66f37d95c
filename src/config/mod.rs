use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const CONFIG_FILE: &str = "config.toml";

// runtime config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Initial heap, passed as `-Xms`. Default `1024M`.
    pub min_memory: String,
    /// Maximum heap, passed as `-Xmx`. Default `4096M`.
    pub max_memory: String,
    /// Extra flags placed right after the heap flags.
    pub jvm_extra_args: Vec<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub user_name: String,
    pub user_type: String,
    /// Placeholder token for offline play. Default `000`.
    pub access_token: String,
    pub game_version: String,
    pub assets_index: String,
    pub main_class: String,
    /// Program used to start the client. Default `java`, resolved through `PATH`.
    pub java_path: String,
    /// Value exported as `JAVA_HOME` to the game. Left untouched when `None`.
    pub java_home: Option<String>,
    /// Game directory override. The platform default is used when `None`.
    pub game_dir: Option<String>,
    /// Assets directory override. `<game_dir>/assets` is used when `None`.
    pub assets_dir: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            min_memory: "1024M".into(),
            max_memory: "4096M".into(),
            jvm_extra_args: Vec::new(),
            window_width: 854,
            window_height: 480,
            user_name: "_ZinhoZin".into(),
            user_type: "mojang".into(),
            access_token: "000".into(),
            game_version: "1.8.8".into(),
            assets_index: "1.8.8".into(),
            main_class: "net.minecraft.client.main.Main".into(),
            java_path: "java".into(),
            java_home: Some("/usr/lib/jvm/java-8-openjdk-amd64".into()),
            game_dir: None,
            assets_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Reads the config at `path`, falling back to defaults when the file does
    /// not exist.
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using default config", path.display());
            return Ok(Self::default());
        }
        let config = fs::read_to_string(path)?;
        Ok(toml::from_str(&config)?)
    }

    /// Writes the config to `path` as pretty TOML.
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Loads the config at `path`, applies `edit` and writes it back.
    /// # Errors
    /// Returns an error if loading or saving fails. Nothing is reported as
    /// changed unless the write succeeded.
    pub fn update<P, F>(path: P, edit: F) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut Self),
    {
        let path = path.as_ref();
        let mut config = Self::load_or_default(path)?;
        edit(&mut config);
        config.save(path)?;
        Ok(config)
    }
}
