//! Backend serving pre-built archives from a local directory
//!
//! Archives are named `author-name-version.tar.gz`; each one's release
//! metadata is read from the `metadata.json` inside it.

use async_trait::async_trait;
use modforge_cache::{read_archive_file, METADATA_FILE};
use modforge_core::error::ForgeError;
use modforge_core::types::{ArchiveHandle, ModuleIdentity, Release};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::backend::ForgeBackend;
use crate::manifest::parse_metadata_json;
use crate::RegistryResult;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A directory of module archives
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    path: PathBuf,
}

impl DirectoryBackend {
    /// Serve archives from `path`, which must be an existing directory
    pub fn new(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(ForgeError::ConfigValidation {
                field: "path".to_string(),
                reason: format!("module directory {} does not exist", path.display()),
            });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive files whose name starts with `prefix`, sorted by file name
    async fn archives(&self, prefix: &str) -> RegistryResult<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| ForgeError::io(format!("Failed to list {}", self.path.display()), e))?;

        let mut archives = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ForgeError::io(format!("Failed to list {}", self.path.display()), e))?
        {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(prefix) && file_name.ends_with(ARCHIVE_SUFFIX) {
                archives.push(entry.path());
            }
        }
        archives.sort();
        Ok(archives)
    }

    /// Release described by one archive, `None` when it cannot be read
    async fn read_release(&self, archive: &Path) -> Option<Release> {
        let bytes = match tokio::fs::read(archive).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "unreadable archive, skipping");
                return None;
            },
        };

        let metadata = match read_archive_file(&bytes, METADATA_FILE) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                warn!(archive = %archive.display(), "archive has no metadata.json, skipping");
                return None;
            },
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "corrupt archive, skipping");
                return None;
            },
        };

        match parse_metadata_json(&metadata) {
            Ok(release) => Some(release),
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "invalid metadata.json, skipping");
                None
            },
        }
    }

    async fn releases(&self, prefix: &str) -> RegistryResult<Vec<Release>> {
        let mut releases = Vec::new();
        for archive in self.archives(prefix).await? {
            if let Some(release) = self.read_release(&archive).await {
                releases.push(release);
            }
        }
        Ok(releases)
    }
}

#[async_trait]
impl ForgeBackend for DirectoryBackend {
    fn describe(&self) -> String {
        format!("directory {}", self.path.display())
    }

    async fn get_module(&self, identity: &ModuleIdentity, version: &str) -> RegistryResult<Option<ArchiveHandle>> {
        let file_name = format!("{}-{}{}", identity.dashed_name(), version, ARCHIVE_SUFFIX);
        let path = self.path.join(&file_name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(archive = %path.display(), "serving archive");
                Ok(Some(ArchiveHandle::new(file_name, bytes)))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ForgeError::io(format!("Failed to read {}", path.display()), e)),
        }
    }

    async fn get_metadata(&self, identity: &ModuleIdentity) -> RegistryResult<Vec<Release>> {
        let prefix = format!("{}-", identity.dashed_name());
        let mut releases = self.releases(&prefix).await?;
        // `a-b-c-1.0.0.tar.gz` matches the prefix of both a/b and a/b-c
        releases.retain(|release| &release.identity == identity);
        Ok(releases)
    }

    async fn get_all_metadata(&self) -> RegistryResult<Vec<Release>> {
        self.releases("").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modforge_cache::{Archiver, TarGzArchiver};
    use tempfile::TempDir;

    fn write_archive(dir: &Path, module: &str, version: &str, deps: &[&str]) {
        let identity = ModuleIdentity::parse(module).unwrap();
        let dependencies: Vec<_> = deps
            .iter()
            .map(|dep| serde_json::json!({ "name": dep, "version_requirement": ">= 1.0.0" }))
            .collect();
        let metadata = serde_json::json!({
            "name": identity.dashed_name(),
            "version": version,
            "summary": format!("{} module", identity.name()),
            "dependencies": dependencies,
        });

        let tree = TempDir::new().unwrap();
        std::fs::write(tree.path().join("README.md"), "readme").unwrap();
        let stem = format!("{}-{}", identity.dashed_name(), version);
        let archive = TarGzArchiver::new()
            .archive(tree.path(), &stem, &serde_json::to_vec(&metadata).unwrap())
            .unwrap();
        std::fs::write(dir.join(&archive.file_name), &archive.bytes).unwrap();
    }

    fn module_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_archive(dir.path(), "puppetlabs/apache", "1.0.0", &["puppetlabs/stdlib"]);
        write_archive(dir.path(), "puppetlabs/apache", "1.1.0", &["puppetlabs/stdlib"]);
        write_archive(dir.path(), "puppetlabs/stdlib", "4.1.0", &[]);
        dir
    }

    #[test]
    fn test_missing_directory() {
        let err = DirectoryBackend::new("/nonexistent/modforge/modules").unwrap_err();
        assert!(matches!(err, ForgeError::ConfigValidation { .. }));
    }

    #[tokio::test]
    async fn test_get_metadata() {
        let dir = module_dir();
        let backend = DirectoryBackend::new(dir.path()).unwrap();

        let releases = backend
            .get_metadata(&ModuleIdentity::new("puppetlabs", "apache"))
            .await
            .unwrap();
        let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
        assert_eq!(releases[0].description, "apache module");
        assert_eq!(releases[0].dependencies[0].identity, ModuleIdentity::new("puppetlabs", "stdlib"));

        let none = backend
            .get_metadata(&ModuleIdentity::new("example", "missing"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_collision() {
        let dir = TempDir::new().unwrap();
        write_archive(dir.path(), "puppetlabs/apache", "1.0.0", &[]);
        write_archive(dir.path(), "puppetlabs/apache_extra", "1.0.0", &[]);
        let backend = DirectoryBackend::new(dir.path()).unwrap();

        let releases = backend
            .get_metadata(&ModuleIdentity::new("puppetlabs", "apache"))
            .await
            .unwrap();
        assert_eq!(releases.len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_metadata_skips_broken_archives() {
        let dir = module_dir();
        std::fs::write(dir.path().join("broken-module-0.1.0.tar.gz"), b"not an archive").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        let backend = DirectoryBackend::new(dir.path()).unwrap();

        let releases = backend.get_all_metadata().await.unwrap();
        let names: Vec<String> = releases
            .iter()
            .map(|r| format!("{} {}", r.identity, r.version))
            .collect();
        assert_eq!(
            names,
            vec!["puppetlabs/apache 1.0.0", "puppetlabs/apache 1.1.0", "puppetlabs/stdlib 4.1.0"]
        );
    }

    #[tokio::test]
    async fn test_get_module() {
        let dir = module_dir();
        let backend = DirectoryBackend::new(dir.path()).unwrap();
        let apache = ModuleIdentity::new("puppetlabs", "apache");

        let archive = backend.get_module(&apache, "1.1.0").await.unwrap().unwrap();
        assert_eq!(archive.file_name, "puppetlabs-apache-1.1.0.tar.gz");
        let on_disk = std::fs::read(dir.path().join("puppetlabs-apache-1.1.0.tar.gz")).unwrap();
        assert_eq!(archive.bytes, on_disk);

        assert!(backend.get_module(&apache, "2.0.0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_cache_is_a_no_op() {
        let dir = module_dir();
        let backend = DirectoryBackend::new(dir.path()).unwrap();
        let apache = ModuleIdentity::new("puppetlabs", "apache");

        backend.clear_cache(None).await.unwrap();
        backend.clear_cache(Some(&apache)).await.unwrap();
        assert_eq!(backend.get_metadata(&apache).await.unwrap().len(), 2);
    }
}
