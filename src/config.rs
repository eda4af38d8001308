/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub controls: ControlsConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Level highlighted first in level select. 1-based, as shown to players.
    pub start_level: usize,
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlsConfig {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub reset: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
    pub back: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    logging: TomlLogging,
    #[serde(default)]
    controls: TomlControls,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_start_level")]
    start_level: usize,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_up")]
    up: Vec<String>,
    #[serde(default = "default_down")]
    down: Vec<String>,
    #[serde(default = "default_left")]
    left: Vec<String>,
    #[serde(default = "default_right")]
    right: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_back")]
    back: Vec<String>,
}

// ── Defaults ──

fn default_start_level() -> usize { 1 }
fn default_tick_rate() -> u64 { 75 }
fn default_log_file() -> String { "portalban.log".into() }
fn default_log_level() -> String { "info".into() }

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_up() -> Vec<String> { keys(&["Up", "W", "K"]) }
fn default_down() -> Vec<String> { keys(&["Down", "S", "J"]) }
fn default_left() -> Vec<String> { keys(&["Left", "A", "H"]) }
fn default_right() -> Vec<String> { keys(&["Right", "D", "L"]) }
fn default_reset() -> Vec<String> { keys(&["R"]) }
fn default_pause() -> Vec<String> { keys(&["Esc", "P"]) }
fn default_confirm() -> Vec<String> { keys(&["Enter", "Space"]) }
fn default_back() -> Vec<String> { keys(&["Esc", "Backspace"]) }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            start_level: default_start_level(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
            reset: default_reset(),
            pause: default_pause(),
            confirm: default_confirm(),
            back: default_back(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(toml_cfg: TomlConfig) -> Self {
        GameConfig {
            general: GeneralConfig {
                start_level: toml_cfg.general.start_level.max(1),
                tick_rate_ms: toml_cfg.general.tick_rate_ms.max(1),
            },
            logging: LoggingConfig {
                file: PathBuf::from(toml_cfg.logging.file),
                level: toml_cfg.logging.level,
            },
            controls: ControlsConfig {
                up: toml_cfg.controls.up,
                down: toml_cfg.controls.down,
                left: toml_cfg.controls.left,
                right: toml_cfg.controls.right,
                reset: toml_cfg.controls.reset,
                pause: toml_cfg.controls.pause,
                confirm: toml_cfg.controls.confirm,
                back: toml_cfg.controls.back,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        load_toml(&candidate_dirs()).into()
    }

    /// Parse config text. Missing tables and keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Into::into)
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its config.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
