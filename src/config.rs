//! Engine settings resolved from flags, environment and `bff.toml`.
//!
//! Each setting is taken from the first place that provides it:
//! command-line flag, then environment variable, then the `[engine]` section
//! of the config file, then the built-in default.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use log::debug;
use serde::Deserialize;

use crate::engine::{EofPolicy, DEFAULT_TAPE_SIZE, MAX_TAPE_SIZE};

pub const ENV_TAPE_SIZE: &str = "BFF_TAPE_SIZE";
pub const ENV_EOF: &str = "BFF_EOF";
pub const ENV_MAX_STEPS: &str = "BFF_MAX_STEPS";
pub const ENV_TIMEOUT_MS: &str = "BFF_TIMEOUT_MS";
/// Overrides the config file location.
pub const ENV_CONFIG: &str = "BFF_CONFIG";

/// Where a rejected value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Flag(&'static str),
    Env(&'static str),
    File(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Flag(name) => write!(f, "flag {name}"),
            Origin::Env(name) => write!(f, "environment variable {name}"),
            Origin::File(path) => write!(f, "config file {}", path.display()),
        }
    }
}

/// Configuration errors, all reported before any program runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid tape size '{value}' ({origin}): expected an integer in 1..={max}", max = MAX_TAPE_SIZE)]
    InvalidTapeSize { value: String, origin: Origin },

    #[error("invalid {key} '{value}' ({origin}): expected a non-negative integer")]
    InvalidNumber {
        key: &'static str,
        value: String,
        origin: Origin,
    },

    #[error("unknown EOF policy '{value}' ({origin}): expected zero, unchanged or max")]
    UnknownEofPolicy { value: String, origin: Origin },
}

/// Raw values given on the command line, not yet validated.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tape_size: Option<String>,
    pub eof: Option<String>,
    pub max_steps: Option<String>,
    pub timeout_ms: Option<String>,
}

/// The `[engine]` section of a `bff.toml` file.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    pub path: PathBuf,
    values: HashMap<String, String>,
}

impl FileConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Fully resolved engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tape_size: usize,
    pub eof: EofPolicy,
    pub max_steps: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            eof: EofPolicy::default(),
            max_steps: None,
            timeout_ms: None,
        }
    }
}

impl Settings {
    /// Resolve against the real process environment and config file.
    pub fn load(flags: &Overrides) -> Result<Self, ConfigError> {
        let file = load_file_config()?;
        Self::resolve(flags, |name| env::var(name).ok(), file.as_ref())
    }

    /// Resolve with an explicit environment lookup and config file.
    pub fn resolve<F>(
        flags: &Overrides,
        env: F,
        file: Option<&FileConfig>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |flag: &Option<String>,
                      flag_name: &'static str,
                      env_name: &'static str,
                      key: &str| {
            if let Some(v) = flag {
                return Some((v.clone(), Origin::Flag(flag_name)));
            }
            if let Some(v) = env(env_name) {
                return Some((v, Origin::Env(env_name)));
            }
            file.and_then(|f| {
                f.get(key)
                    .map(|v| (v.to_string(), Origin::File(f.path.clone())))
            })
        };

        let mut settings = Settings::default();

        let tape_size = lookup(&flags.tape_size, "--memory", ENV_TAPE_SIZE, "tape_size");
        if let Some((value, origin)) = tape_size {
            settings.tape_size = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 && n <= MAX_TAPE_SIZE => n,
                _ => return Err(ConfigError::InvalidTapeSize { value, origin }),
            };
        }

        if let Some((value, origin)) = lookup(&flags.eof, "--eof", ENV_EOF, "eof") {
            settings.eof = EofPolicy::parse(&value)
                .ok_or(ConfigError::UnknownEofPolicy { value, origin })?;
        }

        let max_steps = lookup(&flags.max_steps, "--max-steps", ENV_MAX_STEPS, "max_steps");
        if let Some((value, origin)) = max_steps {
            settings.max_steps = Some(value.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidNumber { key: "max_steps", value: value.clone(), origin }
            })?);
        }

        let timeout_ms = lookup(&flags.timeout_ms, "--timeout", ENV_TIMEOUT_MS, "timeout_ms");
        if let Some((value, origin)) = timeout_ms {
            settings.timeout_ms = Some(value.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidNumber { key: "timeout_ms", value: value.clone(), origin }
            })?);
        }

        debug!("resolved settings: {settings:?}");
        Ok(settings)
    }
}

/// Location of the config file: `$BFF_CONFIG`, else `bff.toml` in the XDG
/// config home.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bff.toml");
    Some(path)
}

/// Read the config file if there is one. A missing file is not an error,
/// a malformed one is.
pub fn load_file_config() -> Result<Option<FileConfig>, ConfigError> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(None);
    };
    debug!("using config file {}", path.display());
    parse_config(path, &content).map(Some)
}

/// Layout of `bff.toml`; only the `[engine]` table is read.
#[derive(Debug, Default, Deserialize)]
struct ConfigToml {
    #[serde(default)]
    engine: HashMap<String, toml::Value>,
}

/// Parse `bff.toml` content. Values in `[engine]` are kept as text so they
/// go through the same validation as flags and environment variables.
pub fn parse_config(path: PathBuf, content: &str) -> Result<FileConfig, ConfigError> {
    let parsed: ConfigToml = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let values = parsed
        .engine
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect();

    Ok(FileConfig { path, values })
}
