use crate::config::RuntimeConfig;
use crate::error::{LaunchError, Result};
use crate::platform::{self, Platform};
use log::{debug, warn};
use regex::{Captures, Regex};
use std::{
    collections::HashMap,
    env, fmt,
    path::{self, Path, PathBuf},
    sync::LazyLock,
};
use walkdir::WalkDir;

#[cfg(target_os = "windows")]
const CLASSPATH_SEPARATOR: &str = ";";

#[cfg(not(target_os = "windows"))]
const CLASSPATH_SEPARATOR: &str = ":";

const DOWNLOADS_DIR: &str = "downloads";
const CLIENT_JAR: &str = "minecraft.jar";
const NATIVES_DIR: &str = "natives";
const LIBRARIES_DIR: &str = "libraries";
const LIBRARY_EXTENSION: &str = ".jar";

const JVM_MEMORY_ARGUMENTS: [&str; 2] = ["-Xms${min_memory}", "-Xmx${max_memory}"];

const JVM_PATH_ARGUMENTS: [&str; 3] = [
    "-Djava.library.path=${natives_directory}",
    "-cp",
    "${classpath}",
];

const GAME_ARGUMENTS: [&str; 18] = [
    "--accessToken",
    "${auth_access_token}",
    "--version",
    "${version_name}",
    "--gameDir",
    "${game_directory}",
    "--assetsDir",
    "${assets_root}",
    "--assetsIndex",
    "${assets_index_name}",
    "--width",
    "${resolution_width}",
    "--height",
    "${resolution_height}",
    "--username",
    "${auth_player_name}",
    "--userType",
    "${user_type}",
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\w+\}").expect("placeholder pattern is valid"));

fn replace_arguments<S: AsRef<str>>(args: &[S], valuemap: &HashMap<&str, String>) -> Vec<String> {
    args.iter()
        .map(|x| {
            PLACEHOLDER
                .replace_all(x.as_ref(), |c: &Captures| {
                    valuemap
                        .get(&c[0])
                        .cloned()
                        .unwrap_or_else(|| c[0].to_string())
                })
                .into_owned()
        })
        .collect()
}

/// A program with its argument vector and environment overrides.
///
/// Arguments are handed to the OS as-is, nothing is re-parsed by a shell.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl LaunchCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// True when there is nothing to execute.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.program.trim().is_empty()
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_owned();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Renders the command as a single line, quoting arguments with whitespace.
impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Builds the launch command for the client found under a base directory.
///
/// The expected layout is
/// ```text
/// <base>/minecraft.jar
/// <base>/natives/
/// <base>/libraries/*.jar
/// ```
pub struct Launcher {
    base_dir: PathBuf,
    config: RuntimeConfig,
    platform: Box<dyn Platform>,
}

impl Launcher {
    /// Uses `<working dir>/downloads` as the base directory.
    /// # Errors
    /// Returns [`LaunchError::WorkingDirectory`] if the working directory
    /// cannot be read.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let cwd = env::current_dir().map_err(LaunchError::WorkingDirectory)?;
        Ok(Self::with_base_dir(cwd.join(DOWNLOADS_DIR), config))
    }

    /// A relative `base_dir` is resolved against the working directory.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>, config: RuntimeConfig) -> Self {
        let base_dir = base_dir.into();
        Self {
            base_dir: path::absolute(&base_dir).unwrap_or(base_dir),
            config,
            platform: platform::current(),
        }
    }

    /// Replaces the host platform used for the default game directory.
    #[must_use]
    pub fn platform(mut self, platform: Box<dyn Platform>) -> Self {
        self.platform = platform;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.base_dir.join(CLIENT_JAR)
    }

    #[must_use]
    pub fn natives_dir(&self) -> PathBuf {
        self.base_dir.join(NATIVES_DIR)
    }

    #[must_use]
    pub fn libraries_dir(&self) -> PathBuf {
        self.base_dir.join(LIBRARIES_DIR)
    }

    fn game_directory(&self) -> PathBuf {
        self.config.game_dir.as_ref().map_or_else(
            || {
                debug!("using {} game directory", self.platform.name());
                self.platform.game_directory()
            },
            PathBuf::from,
        )
    }

    fn assets_directory(&self) -> PathBuf {
        match (&self.config.assets_dir, &self.config.game_dir) {
            (Some(assets), _) => PathBuf::from(assets),
            (None, Some(game)) => Path::new(game).join("assets"),
            (None, None) => self.platform.assets_directory(),
        }
    }

    /// Builds the command that starts the client jar at `artifact`.
    /// # Errors
    /// Returns a precondition error if `artifact` is not a file or if the
    /// natives or libraries directory is missing, and
    /// [`LaunchError::EmptyCommand`] if the configured program is blank.
    pub fn build_command(&self, artifact: &Path) -> Result<LaunchCommand> {
        if !artifact.is_file() {
            return Err(LaunchError::ArtifactNotFound(artifact.to_path_buf()));
        }
        let natives_dir = self.natives_dir();
        if !natives_dir.exists() {
            return Err(LaunchError::DirectoryNotFound {
                kind: NATIVES_DIR,
                path: natives_dir,
            });
        }
        let libraries_dir = self.libraries_dir();
        if !libraries_dir.exists() {
            return Err(LaunchError::DirectoryNotFound {
                kind: LIBRARIES_DIR,
                path: libraries_dir,
            });
        }

        let artifact = path::absolute(artifact).unwrap_or_else(|_| artifact.to_path_buf());
        let libraries = library_paths(&libraries_dir);
        let config = &self.config;
        let valuemap = HashMap::from([
            ("${min_memory}", config.min_memory.clone()),
            ("${max_memory}", config.max_memory.clone()),
            (
                "${natives_directory}",
                natives_dir.to_string_lossy().into(),
            ),
            ("${classpath}", classpath(&artifact, &libraries)),
            ("${auth_access_token}", config.access_token.clone()),
            ("${version_name}", config.game_version.clone()),
            (
                "${game_directory}",
                self.game_directory().to_string_lossy().into(),
            ),
            (
                "${assets_root}",
                self.assets_directory().to_string_lossy().into(),
            ),
            ("${assets_index_name}", config.assets_index.clone()),
            ("${resolution_width}", config.window_width.to_string()),
            ("${resolution_height}", config.window_height.to_string()),
            ("${auth_player_name}", config.user_name.clone()),
            ("${user_type}", config.user_type.clone()),
        ]);

        let mut command = LaunchCommand::new(config.java_path.trim());
        command
            .args(replace_arguments(&JVM_MEMORY_ARGUMENTS, &valuemap))
            .args(config.jvm_extra_args.iter().cloned())
            .args(replace_arguments(&JVM_PATH_ARGUMENTS, &valuemap))
            .arg(config.main_class.clone())
            .args(replace_arguments(&GAME_ARGUMENTS, &valuemap));
        if let Some(java_home) = &config.java_home {
            command.env("JAVA_HOME", java_home.clone());
        }

        if command.is_blank() {
            return Err(LaunchError::EmptyCommand);
        }
        debug!("{command:#?}");
        Ok(command)
    }
}

/// Lists the `.jar` files directly inside `dir`, sorted by name.
///
/// A directory that cannot be listed yields an empty list and a warning.
fn library_paths(dir: &Path) -> Vec<PathBuf> {
    let mut libraries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_string_lossy()
                        .ends_with(LIBRARY_EXTENSION)
                {
                    libraries.push(entry.into_path());
                }
            }
            Err(e) => warn!("failed to list {}: {e}", dir.display()),
        }
    }
    if libraries.is_empty() {
        warn!("no libraries found in {}", dir.display());
    }
    libraries
}

fn classpath(artifact: &Path, libraries: &[PathBuf]) -> String {
    let paths: Vec<_> = std::iter::once(artifact)
        .chain(libraries.iter().map(PathBuf::as_path))
        .map(Path::to_string_lossy)
        .collect();
    paths.join(CLASSPATH_SEPARATOR)
}

#[test]
fn test_replace_arguments() {
    let valuemap = HashMap::from([
        ("${natives_directory}", "native".into()),
        ("${launcher_name}", "launcher".into()),
    ]);
    let args = [
        "start--${natives_directory}--end",
        "${abababa}end",
        "${launcher_name}-${natives_directory}",
        "normal",
    ];

    let answer = Vec::from([
        "start--native--end".to_string(),
        "${abababa}end".to_string(),
        "launcher-native".to_string(),
        "normal".to_string(),
    ]);

    let res = replace_arguments(&args, &valuemap);

    assert_eq!(answer, res);
}

#[test]
fn test_display_quotes_whitespace() {
    let mut command = LaunchCommand::new("java");
    command.args(["-cp", "/opt/my game/a.jar", "", "plain"]);
    assert_eq!(
        command.to_string(),
        "java -cp \"/opt/my game/a.jar\" \"\" plain"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedPlatform(PathBuf);

    impl Platform for FixedPlatform {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn game_directory(&self) -> PathBuf {
            self.0.clone()
        }
    }

    fn layout() -> (TempDir, Launcher) {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(DOWNLOADS_DIR);
        fs::create_dir_all(base.join(NATIVES_DIR)).unwrap();
        fs::create_dir_all(base.join(LIBRARIES_DIR)).unwrap();
        fs::write(base.join(CLIENT_JAR), b"client").unwrap();
        let launcher = Launcher::with_base_dir(base, RuntimeConfig::default())
            .platform(Box::new(FixedPlatform(PathBuf::from("/home/steve/.minecraft"))));
        (dir, launcher)
    }

    fn classpath_arg(command: &LaunchCommand) -> &str {
        let index = command.args.iter().position(|x| x == "-cp").unwrap();
        &command.args[index + 1]
    }

    #[test]
    fn test_default_arguments() {
        let (_dir, launcher) = layout();
        let artifact = launcher.artifact_path();
        let command = launcher.build_command(&artifact).unwrap();
        let natives = launcher.natives_dir();

        assert_eq!(command.program, "java");
        let expected: Vec<String> = [
            "-Xms1024M".to_string(),
            "-Xmx4096M".to_string(),
            format!("-Djava.library.path={}", natives.display()),
            "-cp".to_string(),
            artifact.to_string_lossy().into(),
            "net.minecraft.client.main.Main".to_string(),
            "--accessToken".to_string(),
            "000".to_string(),
            "--version".to_string(),
            "1.8.8".to_string(),
            "--gameDir".to_string(),
            "/home/steve/.minecraft".to_string(),
            "--assetsDir".to_string(),
            Path::new("/home/steve/.minecraft")
                .join("assets")
                .to_string_lossy()
                .into(),
            "--assetsIndex".to_string(),
            "1.8.8".to_string(),
            "--width".to_string(),
            "854".to_string(),
            "--height".to_string(),
            "480".to_string(),
            "--username".to_string(),
            "_ZinhoZin".to_string(),
            "--userType".to_string(),
            "mojang".to_string(),
        ]
        .into();
        assert_eq!(command.args, expected);
        assert_eq!(
            command.envs,
            vec![(
                "JAVA_HOME".to_string(),
                "/usr/lib/jvm/java-8-openjdk-amd64".to_string()
            )]
        );
    }

    #[test]
    fn test_relative_base_dir_is_made_absolute() {
        let launcher = Launcher::with_base_dir(DOWNLOADS_DIR, RuntimeConfig::default());
        let base = env::current_dir().unwrap().join(DOWNLOADS_DIR);
        assert!(launcher.base_dir().is_absolute());
        assert_eq!(launcher.base_dir(), base);
        assert_eq!(launcher.natives_dir(), base.join(NATIVES_DIR));
        assert_eq!(launcher.libraries_dir(), base.join(LIBRARIES_DIR));
    }

    #[test]
    fn test_missing_artifact() {
        let (_dir, launcher) = layout();
        fs::remove_file(launcher.artifact_path()).unwrap();
        let err = launcher
            .build_command(&launcher.artifact_path())
            .unwrap_err();
        assert!(matches!(err, LaunchError::ArtifactNotFound(p) if p == launcher.artifact_path()));
    }

    #[test]
    fn test_missing_natives() {
        let (_dir, launcher) = layout();
        fs::remove_dir(launcher.natives_dir()).unwrap();
        let err = launcher
            .build_command(&launcher.artifact_path())
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(err
            .to_string()
            .contains(&launcher.natives_dir().display().to_string()));
        assert!(
            matches!(err, LaunchError::DirectoryNotFound { kind: "natives", path } if path == launcher.natives_dir())
        );
    }

    #[test]
    fn test_missing_libraries() {
        let (_dir, launcher) = layout();
        fs::remove_dir(launcher.libraries_dir()).unwrap();
        let err = launcher
            .build_command(&launcher.artifact_path())
            .unwrap_err();
        assert!(
            matches!(err, LaunchError::DirectoryNotFound { kind: "libraries", path } if path == launcher.libraries_dir())
        );
    }

    #[test]
    fn test_classpath_keeps_only_jars() {
        let (_dir, launcher) = layout();
        let libraries = launcher.libraries_dir();
        for name in ["b.jar", "c.txt", "a.jar"] {
            fs::write(libraries.join(name), b"").unwrap();
        }
        fs::create_dir(libraries.join("nested.jar")).unwrap();

        let artifact = launcher.artifact_path();
        let command = launcher.build_command(&artifact).unwrap();
        let expected = [
            artifact.to_string_lossy().to_string(),
            libraries.join("a.jar").to_string_lossy().to_string(),
            libraries.join("b.jar").to_string_lossy().to_string(),
        ]
        .join(CLASSPATH_SEPARATOR);
        assert_eq!(classpath_arg(&command), expected);
    }

    #[test]
    fn test_unlistable_libraries_fall_back_to_artifact() {
        let (_dir, launcher) = layout();
        let libraries = launcher.libraries_dir();
        fs::remove_dir(&libraries).unwrap();
        fs::write(&libraries, b"not a directory").unwrap();

        let artifact = launcher.artifact_path();
        let command = launcher.build_command(&artifact).unwrap();
        assert_eq!(classpath_arg(&command), artifact.to_string_lossy());
    }

    #[test]
    fn test_build_is_repeatable() {
        let (_dir, launcher) = layout();
        for name in ["z.jar", "m.jar", "a.jar"] {
            fs::write(launcher.libraries_dir().join(name), b"").unwrap();
        }
        let artifact = launcher.artifact_path();
        let first = launcher.build_command(&artifact).unwrap();
        let second = launcher.build_command(&artifact).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_config_overrides() {
        let (_dir, launcher) = layout();
        let config = RuntimeConfig {
            user_name: "Alex".into(),
            window_width: 1920,
            window_height: 1080,
            jvm_extra_args: vec!["-XX:+UseG1GC".into()],
            java_path: "/opt/jdk/bin/java".into(),
            java_home: None,
            game_dir: Some("/srv/game".into()),
            ..Default::default()
        };
        let launcher = Launcher::with_base_dir(launcher.base_dir(), config);
        let command = launcher.build_command(&launcher.artifact_path()).unwrap();

        assert_eq!(command.program, "/opt/jdk/bin/java");
        assert_eq!(command.args[2], "-XX:+UseG1GC");
        assert!(command.args[3].starts_with("-Djava.library.path="));
        assert!(command.envs.is_empty());
        let value = |flag: &str| {
            let index = command.args.iter().position(|x| x == flag).unwrap();
            command.args[index + 1].clone()
        };
        assert_eq!(value("--username"), "Alex");
        assert_eq!(value("--width"), "1920");
        assert_eq!(value("--height"), "1080");
        assert_eq!(value("--gameDir"), "/srv/game");
        assert_eq!(
            value("--assetsDir"),
            Path::new("/srv/game").join("assets").to_string_lossy()
        );
    }

    #[test]
    fn test_blank_program() {
        let (_dir, launcher) = layout();
        let config = RuntimeConfig {
            java_path: "  ".into(),
            ..Default::default()
        };
        let launcher = Launcher::with_base_dir(launcher.base_dir(), config);
        let err = launcher
            .build_command(&launcher.artifact_path())
            .unwrap_err();
        assert!(matches!(err, LaunchError::EmptyCommand));
    }
}
