pub mod front_matter;
pub mod index;
pub mod layout;

use std::fs;
use std::path::Path;

use crate::error::ExtractError;

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ExtractError::io(path, e))
}
