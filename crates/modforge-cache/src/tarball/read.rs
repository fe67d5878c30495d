//! Reading entries back out of module archives without extracting them

use flate2::read::GzDecoder;
use modforge_core::error::ForgeError;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::CacheResult;

/// Content of `file_name` directly under the archive's top-level directory
///
/// A file at the archive root is accepted as well.
pub fn read_archive_file(bytes: &[u8], file_name: &str) -> CacheResult<Option<Vec<u8>>> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| ForgeError::io("Failed to read archive".to_string(), e))?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| ForgeError::io("Failed to read archive entry".to_string(), e))?;
        let path = entry
            .path()
            .map_err(|e| ForgeError::io("Invalid path in archive".to_string(), e))?
            .into_owned();

        if is_top_level_file(&path, file_name) {
            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .map_err(|e| ForgeError::io(format!("Failed to read {} from archive", file_name), e))?;
            return Ok(Some(content));
        }
    }

    Ok(None)
}

/// Every entry path in archive order; directories end with `/`
pub fn list_entries(bytes: &[u8]) -> CacheResult<Vec<String>> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let entries = archive
        .entries()
        .map_err(|e| ForgeError::io("Failed to read archive".to_string(), e))?;

    let mut names = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| ForgeError::io("Failed to read archive entry".to_string(), e))?;
        let mut name = entry
            .path()
            .map_err(|e| ForgeError::io("Invalid path in archive".to_string(), e))?
            .to_string_lossy()
            .into_owned();
        if entry.header().entry_type().is_dir() && !name.ends_with('/') {
            name.push('/');
        }
        names.push(name);
    }
    Ok(names)
}

fn is_top_level_file(path: &Path, file_name: &str) -> bool {
    let components: Vec<_> = path.components().collect();
    match components.as_slice() {
        [only] => only.as_os_str() == file_name,
        [_, last] => last.as_os_str() == file_name,
        _ => false,
    }
}
