use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Resolve, read, override from the environment and validate.
    ///
    /// Path precedence: `explicit` (tilde-expanded) > `PALATE_CONFIG` >
    /// `~/.palate/config.toml`. An explicitly named file must exist; a missing
    /// default file means built-in defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let named = explicit
            .map(str::to_owned)
            .or_else(|| std::env::var("PALATE_CONFIG").ok().filter(|p| !p.is_empty()));

        let mut config = match named {
            Some(raw) => {
                let path = expand_path(&raw);
                Self::from_file(&path)?
            }
            None => {
                let path = Self::default_dir().join("config.toml");
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self {
                        config_path: path,
                        ..Self::default()
                    }
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

pub(crate) fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}
