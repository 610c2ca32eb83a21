use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::prepare::ResizeFilter;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resize_filter: ResizeFilter,
    pub create_parent_dirs: bool,
    pub remove_partial_output: bool,
    pub strict_exit_codes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resize_filter: ResizeFilter::Lanczos3,
            create_parent_dirs: true,
            remove_partial_output: true,
            strict_exit_codes: true,
        }
    }
}

const DEFAULT_CONFIG: &str = "\
# Icon Converter configuration

# Resampling filter used to scale the input to 256x256
# One of: nearest, triangle, catmull-rom, gaussian, lanczos3
# resize_filter = \"lanczos3\"

# Create missing parent directories of the output file
# create_parent_dirs = true

# Delete the output file if writing it fails partway
# remove_partial_output = true

# Exit with status 2 on bad arguments or a missing input file.
# Set to false to exit quietly with status 0 instead.
# strict_exit_codes = true
";

impl Config {
    pub fn app_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".into());
            PathBuf::from(appdata).join("icon-converter")
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("icon-converter")
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let base = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
                    PathBuf::from(home).join(".config")
                });
            base.join("icon-converter")
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Reads `path`, or writes a commented default config there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            tracing::info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create config directory: {}", e);
        } else if let Err(e) = std::fs::write(path, DEFAULT_CONFIG) {
            tracing::warn!("Failed to write default config: {}", e);
        } else {
            tracing::info!("Created default config at {}", path.display());
        }
        Ok(Config::default())
    }

    fn config_path() -> PathBuf {
        Self::app_dir().join("config.toml")
    }
}
