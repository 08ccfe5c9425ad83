//! Optional TOML overlay for [`SocConfig`]. Precedence, lowest to highest:
//! `SocConfig::default()` < config file < CLI flags. Every field is optional
//! in the file so a config can override just one base address.

use riscv32_core::soc::SocConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parsing config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rom_base: Option<u32>,
    pub ram_base: Option<u32>,
    pub io_base: Option<u32>,
    pub rom_size_bytes: Option<u32>,
    pub ram_size_bytes: Option<u32>,
    pub io_size_bytes: Option<u32>,
    pub strict_diagnostics: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })
    }

    /// Apply every `Some` field onto `config`, leaving unset fields alone.
    pub fn apply(&self, mut config: SocConfig) -> SocConfig {
        if let Some(v) = self.rom_base {
            config.rom_base = v;
        }
        if let Some(v) = self.ram_base {
            config.ram_base = v;
        }
        if let Some(v) = self.io_base {
            config.io_base = v;
        }
        if let Some(v) = self.rom_size_bytes {
            config.rom_size_bytes = v;
        }
        if let Some(v) = self.ram_size_bytes {
            config.ram_size_bytes = v;
        }
        if let Some(v) = self.io_size_bytes {
            config.io_size_bytes = v;
        }
        if let Some(v) = self.strict_diagnostics {
            config.strict_diagnostics = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_only_overrides_named_fields() {
        let file = FileConfig { ram_base: Some(0x8000_0000), ..FileConfig::default() };
        let config = file.apply(SocConfig::default());
        assert_eq!(config.ram_base, 0x8000_0000);
        assert_eq!(config.rom_base, SocConfig::default().rom_base);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = toml::from_str::<FileConfig>("bogus_field = 1").unwrap_err();
        assert!(err.to_string().contains("bogus_field") || err.to_string().contains("unknown"));
    }
}
