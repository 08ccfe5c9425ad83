//! Flat ROM image loading. Wraps `std::fs::read` in a named error type
//! instead of surfacing the raw `std::io::Error`, mirroring
//! [`crate::config::ConfigError`]'s shape in this same crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("reading ROM image {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}

pub fn load_rom(path: &Path) -> Result<Vec<u8>, RomLoadError> {
    std::fs::read(path).map_err(|source| RomLoadError::Read { path: path.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_rom(Path::new("/nonexistent/path/to/a/rom/image.bin")).unwrap_err();
        assert!(matches!(err, RomLoadError::Read { .. }));
    }
}
