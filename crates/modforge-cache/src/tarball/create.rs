//! Deterministic archive creation from a checked-out module tree

use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use modforge_core::error::ForgeError;
use modforge_core::types::ArchiveHandle;
use std::fmt;
use std::path::Path;
use tar::{Builder, EntryType, Header, HeaderMode};
use walkdir::WalkDir;

use crate::CacheResult;

/// Name of the generated metadata file inside every archive
pub const METADATA_FILE: &str = "metadata.json";

/// Turns a working tree plus rendered metadata into a downloadable archive
pub trait Archiver: Send + Sync + fmt::Debug {
    /// Archive `working_dir` under the top-level directory `name`
    ///
    /// `metadata_json` is written to `name/metadata.json`, replacing any file
    /// of that name in the tree.
    fn archive(&self, working_dir: &Path, name: &str, metadata_json: &[u8]) -> CacheResult<ArchiveHandle>;
}

/// Gzip'd tar archiver with fixed timestamps and ownership
#[derive(Debug, Clone, Default)]
pub struct TarGzArchiver {
    compression: Compression,
}

impl TarGzArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific gzip level
    pub fn with_compression(level: u32) -> Self {
        Self {
            compression: Compression::new(level),
        }
    }
}

impl Archiver for TarGzArchiver {
    fn archive(&self, working_dir: &Path, name: &str, metadata_json: &[u8]) -> CacheResult<ArchiveHandle> {
        let gz_encoder = GzBuilder::new().mtime(0).write(Vec::new(), self.compression);
        let mut tar_builder = Builder::new(gz_encoder);
        tar_builder.mode(HeaderMode::Deterministic);

        append_tree(&mut tar_builder, working_dir, name)?;

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(metadata_json.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        tar_builder
            .append_data(&mut header, Path::new(name).join(METADATA_FILE), metadata_json)
            .map_err(|e| ForgeError::io("Failed to add metadata to archive".to_string(), e))?;

        let bytes = tar_builder
            .into_inner()
            .and_then(GzEncoder::finish)
            .map_err(|e| ForgeError::io("Failed to finish archive".to_string(), e))?;

        Ok(ArchiveHandle::new(format!("{}.tar.gz", name), bytes))
    }
}

/// Add every file and directory of `source_dir` in file-name order
fn append_tree(
    tar_builder: &mut Builder<GzEncoder<Vec<u8>>>,
    source_dir: &Path,
    name: &str,
) -> CacheResult<()> {
    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| ForgeError::io("Failed to walk module tree".to_string(), e.into()))?;
        let path = entry.path();
        let relative_path = path.strip_prefix(source_dir).map_err(|e| {
            ForgeError::io(
                format!("Failed to strip prefix: {}", e),
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        // Skip the root directory itself and the tree's own metadata file
        if relative_path.as_os_str().is_empty() || relative_path == Path::new(METADATA_FILE) {
            continue;
        }

        let archive_path = Path::new(name).join(relative_path);
        if entry.file_type().is_file() {
            tar_builder
                .append_path_with_name(path, &archive_path)
                .map_err(|e| ForgeError::io(format!("Failed to archive {}", path.display()), e))?;
        } else if entry.file_type().is_dir() {
            tar_builder
                .append_dir(&archive_path, path)
                .map_err(|e| ForgeError::io(format!("Failed to archive {}", path.display()), e))?;
        }
        // Symlinks and special files are left out
    }

    Ok(())
}
