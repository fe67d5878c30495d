//! Unit tests for the git backend

use super::*;
use modforge_cache::{list_entries, read_archive_file, FakeGit, DEFAULT_TTL};
use tempfile::TempDir;
use std::time::Duration;

const SOURCE: &str = "https://git.example.com/puppetlabs/puppetlabs-apache.git";

fn modulefile(version: &str) -> String {
    format!(
        "name 'puppetlabs-apache'\nversion '{}'\ndescription 'Apache module'\ndependency 'puppetlabs/stdlib', '>= 2.4.0'\n",
        version
    )
}

fn apache_remote() -> FakeGit {
    FakeGit::new()
        .with_tag("1.0.0", &[("Modulefile", modulefile("1.0.0").as_str())])
        .with_tag("1.1.0", &[
            ("Modulefile", modulefile("1.1.0").as_str()),
            ("manifests/init.pp", "class apache {}\n"),
        ])
        .with_tag("scratch", &[("Modulefile", "garbage")])
}

fn backend(git: &Arc<FakeGit>, dir: &TempDir, pattern: &str) -> GitBackend {
    let source = VersionSource::new(SOURCE, dir.path().join("apache"), DEFAULT_TTL, git.clone());
    GitBackend::new(apache(), source, TagPattern::new(pattern).unwrap())
}

fn apache() -> ModuleIdentity {
    ModuleIdentity::new("puppetlabs", "apache")
}

#[tokio::test]
async fn test_releases_from_matching_tags() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    let releases = backend.get_metadata(&apache()).await.unwrap();

    let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    assert!(releases.iter().all(|r| r.identity == apache()));
    assert_eq!(releases[0].description, "Apache module");
    assert_eq!(releases[0].dependencies[0].identity, ModuleIdentity::new("puppetlabs", "stdlib"));
    assert_eq!(releases[0].dependencies[0].version_requirement, ">= 2.4.0");
}

#[tokio::test]
async fn test_unowned_module_never_touches_git() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");
    let other = ModuleIdentity::new("puppetlabs", "stdlib");

    assert!(backend.get_metadata(&other).await.unwrap().is_empty());
    assert!(backend.get_module(&other, "1.0.0").await.unwrap().is_none());
    backend.clear_cache(Some(&other)).await.unwrap();

    assert_eq!(git.call_count(), 0);
    assert!(!backend.source().mirror_path().exists());
}

#[tokio::test]
async fn test_bad_manifest_is_skipped() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(
        apache_remote()
            .with_tag("1.2.0", &[("metadata.json", "{ truncated")])
            .with_tag("1.3.0", &[("README.md", "no manifest here")]),
    );
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    let releases = backend.get_metadata(&apache()).await.unwrap();
    let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
}

#[tokio::test]
async fn test_metadata_json_preferred_over_modulefile() {
    let dir = TempDir::new().unwrap();
    let metadata = r#"{"name":"puppetlabs-apache","version":"2.0.0","summary":"From metadata.json"}"#;
    let git = Arc::new(FakeGit::new().with_tag("v2.0.0", &[
        ("metadata.json", metadata),
        ("Modulefile", modulefile("2.0.0").as_str()),
    ]));
    let backend = backend(&git, &dir, DEFAULT_TAG_PATTERN);

    let releases = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].version, "2.0.0");
    assert_eq!(releases[0].description, "From metadata.json");
    assert!(releases[0].dependencies.is_empty());
}

#[tokio::test]
async fn test_version_comes_from_tag() {
    let dir = TempDir::new().unwrap();
    // Manifest was not bumped before tagging
    let git = Arc::new(FakeGit::new().with_tag("v1.0.1", &[("Modulefile", modulefile("1.0.0").as_str())]));
    let backend = backend(&git, &dir, DEFAULT_TAG_PATTERN);

    let releases = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(releases[0].version, "1.0.1");
}

#[tokio::test]
async fn test_get_module_archives_tag() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    let archive = backend.get_module(&apache(), "1.1.0").await.unwrap().unwrap();
    assert_eq!(archive.file_name, "puppetlabs-apache-1.1.0.tar.gz");

    let entries = list_entries(&archive.bytes).unwrap();
    assert_eq!(
        entries,
        vec![
            "puppetlabs-apache-1.1.0/Modulefile",
            "puppetlabs-apache-1.1.0/manifests/",
            "puppetlabs-apache-1.1.0/manifests/init.pp",
            "puppetlabs-apache-1.1.0/metadata.json",
        ]
    );

    let metadata = read_archive_file(&archive.bytes, "metadata.json").unwrap().unwrap();
    let metadata: ModuleMetadata = serde_json::from_slice(&metadata).unwrap();
    assert_eq!(metadata.name, "puppetlabs-apache");
    assert_eq!(metadata.version, "1.1.0");
    assert_eq!(metadata.dependencies[0].name, "puppetlabs/stdlib");
}

#[tokio::test]
async fn test_get_module_unknown_version() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    assert!(backend.get_module(&apache(), "9.9.9").await.unwrap().is_none());
    // Non-release tags are not downloadable either
    assert!(backend.get_module(&apache(), "scratch").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_all_metadata_is_own_module() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    let all = backend.get_all_metadata().await.unwrap();
    let own = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(all, own);
}

#[tokio::test]
async fn test_clear_cache_forces_reclone() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    backend.get_metadata(&apache()).await.unwrap();
    backend.clear_cache(None).await.unwrap();
    assert!(!backend.source().mirror_path().exists());

    backend.get_metadata(&apache()).await.unwrap();
    backend.clear_cache(Some(&apache())).await.unwrap();
    backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(git.clone_count(), 3);
}

#[tokio::test]
async fn test_unavailable_source_is_an_error() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    git.set_unavailable(true);
    let backend = backend(&git, &dir, r"^\d+\.\d+\.\d+$");

    let err = backend.get_metadata(&apache()).await.unwrap_err();
    assert!(matches!(err, ForgeError::SourceUnavailable { .. }));
    assert!(backend.get_module(&apache(), "1.0.0").await.is_err());
}

#[tokio::test]
async fn test_metadata_refreshes_once_per_call() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(apache_remote());
    let source = VersionSource::new(SOURCE, dir.path().join("apache"), Duration::ZERO, git.clone());
    let backend = GitBackend::new(apache(), source, TagPattern::new(r"^\d+\.\d+\.\d+$").unwrap());

    backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(git.clone_count(), 1);
    assert_eq!(git.fetch_count(), 0);
    let calls = git.call_count();

    let releases = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(releases.len(), 2);
    assert_eq!(git.fetch_count(), 1);
    // fetch, tag, then metadata.json and Modulefile lookups for both releases
    assert_eq!(git.call_count() - calls, 6);
}

#[tokio::test]
async fn test_same_version_under_two_tags_is_one_release() {
    let dir = TempDir::new().unwrap();
    let git = Arc::new(
        FakeGit::new()
            .with_tag("v1.0.0", &[("Modulefile", modulefile("1.0.0").as_str()), ("README.md", "from v1.0.0")])
            .with_tag("1.0.0", &[("Modulefile", modulefile("1.0.0").as_str()), ("README.md", "from 1.0.0")]),
    );
    let backend = backend(&git, &dir, DEFAULT_TAG_PATTERN);

    let releases = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(releases.len(), 1);

    let archive = backend.get_module(&apache(), "1.0.0").await.unwrap().unwrap();
    let readme = read_archive_file(&archive.bytes, "README.md").unwrap().unwrap();
    assert_eq!(readme, b"from v1.0.0");
}
