use crate::error::Error;
use crate::render::{ColorMode, RenderMode};
use crate::scene::population::Spawn;
use crate::scene::shading::Turbulence;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User configuration loaded from config file.
/// All fields are optional: CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default render mode
    pub render: Option<RenderMode>,
    /// Default color mode
    pub color: Option<ColorMode>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Background point count scale factor (0.5-2.0)
    pub scale: Option<f64>,
    /// Fixed RNG seed for reproducible scenes
    pub seed: Option<u64>,
    /// Spawn direction sampling
    pub spawn: Option<Spawn>,
    /// Accretion disk turbulence source
    pub turbulence: Option<Turbulence>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Color quantization step (0 = off, 4/8/16 = coarser colors for less output)
    pub color_quant: Option<u8>,
    /// Write logs here (the terminal itself is busy rendering)
    pub log_file: Option<PathBuf>,
    /// External scroll feed: "stdin" or a file path
    pub feed: Option<String>,
}

/// Get the config file path: ~/.config/event-horizon/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("event-horizon").join("config.toml"))
}

pub fn parse_config(contents: &str, path: &Path) -> Result<Config, Error> {
    toml::from_str(contents).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from file. A missing file yields the defaults.
pub fn load_config() -> Result<Config, Error> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    parse_config(&contents, &path)
}

/// Write the commented default config unless one already exists.
pub fn init_config() -> Result<Option<PathBuf>, Error> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    if path.exists() {
        return Ok(None);
    }
    let write = |path: &Path| -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, default_config_string())
    };
    write(&path).map_err(|source| Error::ConfigWrite {
        path: path.clone(),
        source,
    })?;
    Ok(Some(path))
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r#"# event-horizon configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.

# Render mode: braille, half-block, ascii
# render = "half-block"

# Color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 30

# Background star/particle count scale factor (0.5-2.0)
# scale = 1.0

# Fixed random seed (omit for a fresh scene every run)
# seed = 42

# Spawn direction sampling: source-compatible, uniform
# spawn = "source-compatible"

# Accretion disk turbulence: hash, perlin, off
# turbulence = "hash"

# Hide status bar
# clean = false

# Color quantization step (0 = off, 4/8/16 = coarser colors, less output)
# color_quant = 0

# Log file (logging is off unless this or RUST_LOG is set)
# log_file = "/tmp/event-horizon.log"

# External scroll feed: "stdin" or a path to a JSON-lines file
# feed = "/tmp/scroll.jsonl"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_to_empty() {
        let config = parse_config(&default_config_string(), Path::new("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn kebab_case_values() {
        let config = parse_config(
            r#"
render = "half-block"
color = "ansi256"
spawn = "uniform"
turbulence = "perlin"
fps = 45
seed = 7
"#,
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(config.render, Some(RenderMode::HalfBlock));
        assert_eq!(config.color, Some(ColorMode::Ansi256));
        assert_eq!(config.spawn, Some(Spawn::Uniform));
        assert_eq!(config.turbulence, Some(Turbulence::Perlin));
        assert_eq!(config.fps, Some(45));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = parse_config("fps = \"fast\"", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
        assert!(parse_config("colour = \"mono\"", Path::new("bad.toml")).is_err());
    }
}
