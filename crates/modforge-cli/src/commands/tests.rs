//! Unit tests for CLI commands.

use super::*;
use camino::Utf8PathBuf;
use modforge_cache::{Archiver, FakeGit, TarGzArchiver};
use modforge_config::CacheSection;
use tempfile::TempDir;

fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::try_from(path.to_path_buf()).unwrap()
}

/// Write `author-name-version.tar.gz` with a generated metadata.json
fn write_archive(dir: &std::path::Path, module: &str, version: &str, deps: &[&str]) {
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

struct Fixture {
    _modules: TempDir,
    cache: TempDir,
    ctx: CommandContext,
}

/// A context over one archive directory holding apache (depending on stdlib) and stdlib
fn create_test_context() -> Fixture {
    let modules = TempDir::new().unwrap();
    write_archive(modules.path(), "puppetlabs/apache", "1.0.0", &["puppetlabs/stdlib"]);
    write_archive(modules.path(), "puppetlabs/apache", "1.1.0", &["puppetlabs/stdlib"]);
    write_archive(modules.path(), "puppetlabs/stdlib", "4.1.0", &[]);

    let cache = TempDir::new().unwrap();
    let config = ModforgeToml {
        cache: CacheSection {
            root: Some(utf8(cache.path())),
            ttl_seconds: Some(0),
        },
        backends: vec![BackendSpec::Directory {
            path: utf8(modules.path()),
        }],
    };
    let ctx = CommandContext::from_config(config, OutputHandler::buffered()).unwrap();
    Fixture {
        _modules: modules,
        cache,
        ctx,
    }
}

#[tokio::test]
async fn test_releases_prints_closure() {
    let fixture = create_test_context();
    releases::execute("puppetlabs/apache", &fixture.ctx).await.unwrap();

    let lines = fixture.ctx.output.lines();
    assert_eq!(lines.len(), 1);
    let document: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["puppetlabs/apache", "puppetlabs/stdlib"]);
    assert_eq!(document["puppetlabs/apache"].as_array().unwrap().len(), 2);
    assert_eq!(
        document["puppetlabs/stdlib"][0]["file"],
        "/modules/puppetlabs-stdlib-4.1.0.tar.gz"
    );
}

#[tokio::test]
async fn test_releases_unknown_module() {
    let fixture = create_test_context();
    let err = releases::execute("nonexistant/nonexistant", &fixture.ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::ModuleNotFound { .. }));
    assert!(fixture.ctx.output.lines().is_empty());
}

#[tokio::test]
async fn test_metadata_prints_summary() {
    let fixture = create_test_context();
    metadata::execute("puppetlabs/apache", &fixture.ctx).await.unwrap();

    let lines = fixture.ctx.output.lines();
    let summary: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(summary["full_name"], "puppetlabs/apache");
    assert_eq!(summary["author"], "puppetlabs");
    assert_eq!(summary["releases"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_metadata_unknown_module() {
    let fixture = create_test_context();
    let err = metadata::execute("puppetlabs/nginx", &fixture.ctx).await.unwrap_err();
    assert!(matches!(err, ForgeError::ModuleNotFound { .. }));
}

#[tokio::test]
async fn test_invalid_module_argument() {
    let fixture = create_test_context();
    let err = metadata::execute("apache", &fixture.ctx).await.unwrap_err();

    match err {
        ForgeError::ConfigValidation { field, .. } => assert_eq!(field, "module"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_prints_every_release() {
    let fixture = create_test_context();
    list::execute(&fixture.ctx).await.unwrap();

    assert_eq!(
        fixture.ctx.output.lines(),
        vec![
            "puppetlabs/apache 1.0.0",
            "puppetlabs/apache 1.1.0",
            "puppetlabs/stdlib 4.1.0"
        ]
    );
}

#[tokio::test]
async fn test_download_writes_archive() {
    let fixture = create_test_context();
    let out = TempDir::new().unwrap();
    let out_dir = utf8(out.path()).join("downloads");

    download::execute("puppetlabs/stdlib", "4.1.0", Some(out_dir.as_path()), &fixture.ctx)
        .await
        .unwrap();

    let written = out_dir.join("puppetlabs-stdlib-4.1.0.tar.gz");
    let bytes = std::fs::read(&written).unwrap();
    let entries = modforge_cache::list_entries(&bytes).unwrap();
    assert!(entries.contains(&"puppetlabs-stdlib-4.1.0/metadata.json".to_string()));
    assert!(fixture.ctx.output.lines()[0].contains("puppetlabs-stdlib-4.1.0.tar.gz"));
}

#[tokio::test]
async fn test_download_unknown_version() {
    let fixture = create_test_context();
    let out = TempDir::new().unwrap();

    let err = download::execute("puppetlabs/stdlib", "9.9.9", Some(utf8(out.path()).as_path()), &fixture.ctx)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_clear_cache() {
    let fixture = create_test_context();
    clear_cache::execute(None, &fixture.ctx).await.unwrap();
    clear_cache::execute(Some("puppetlabs/apache"), &fixture.ctx).await.unwrap();

    let lines = fixture.ctx.output.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("puppetlabs/apache"));
}

#[tokio::test]
async fn test_check_reports_backends() {
    let fixture = create_test_context();
    check::execute(&fixture.ctx).await.unwrap();

    let lines = fixture.ctx.output.lines();
    assert!(lines[0].contains(fixture.cache.path().to_str().unwrap()));
    assert!(lines[0].contains("refresh every 0s"));
    assert!(lines[1].starts_with("  1. directory "));
    assert_eq!(lines.last().unwrap(), "✓ Configuration is valid");
}

#[test]
fn test_build_forge_keeps_backend_order() {
    let modules = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let config = ModforgeToml {
        cache: CacheSection {
            root: Some(utf8(cache.path())),
            ttl_seconds: None,
        },
        backends: vec![
            BackendSpec::Git {
                author: "puppetlabs".to_string(),
                name: "apache".to_string(),
                source: "https://git.example.com/puppetlabs-apache.git".to_string(),
                tag_pattern: Some(r"^release-(\d+\.\d+\.\d+)$".to_string()),
            },
            BackendSpec::Directory {
                path: utf8(modules.path()),
            },
            BackendSpec::Proxy {
                url: "https://forge.example.com".to_string(),
                cache_ttl_seconds: Some(30),
                retries: Some(1),
            },
        ],
    };

    let forge = build_forge(&config).unwrap();
    let described: Vec<String> = forge.backends().iter().map(|b| b.describe()).collect();

    assert_eq!(described.len(), 3);
    assert_eq!(described[0], "git puppetlabs/apache from https://git.example.com/puppetlabs-apache.git");
    assert!(described[1].starts_with("directory "));
    assert_eq!(described[2], "proxy https://forge.example.com/");
    // Building the git backend never touches the mirror
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn test_from_config_rejects_missing_directory() {
    let config = ModforgeToml {
        cache: CacheSection::default(),
        backends: vec![BackendSpec::Directory {
            path: Utf8PathBuf::from("/nonexistent/modforge/modules"),
        }],
    };

    let result = CommandContext::from_config(config, OutputHandler::buffered());
    assert!(matches!(result, Err(ForgeError::ConfigValidation { .. })));
}

#[test]
fn test_from_config_requires_a_backend() {
    let result = CommandContext::from_config(ModforgeToml::default(), OutputHandler::buffered());
    assert!(matches!(result, Err(ForgeError::ConfigValidation { .. })));
}

#[test]
fn test_mirror_pool_shares_sources_by_url() {
    let cache = TempDir::new().unwrap();
    let mut mirrors = MirrorPool::new(utf8(cache.path()), Duration::from_secs(60), Arc::new(FakeGit::new()));

    let first = mirrors.source("https://git.example.com/apache.git");
    let again = mirrors.source("https://git.example.com/apache.git");
    let other = mirrors.source("https://git.example.com/stdlib.git");

    assert!(first.shares_mirror_with(&again));
    assert!(!first.shares_mirror_with(&other));
    assert_ne!(first.cache_path(), other.cache_path());
}

#[tokio::test]
async fn test_backends_on_one_repository_share_its_mirror() {
    let cache = TempDir::new().unwrap();
    let git = Arc::new(
        FakeGit::new()
            .with_tag("1.0.0", &[("Modulefile", "name 'puppetlabs-apache'\nversion '1.0.0'\n")])
            .with_tag("1.1.0", &[("Modulefile", "name 'puppetlabs-apache'\nversion '1.1.0'\n")])
            .with_latency(Duration::from_millis(10)),
    );
    let url = "https://git.example.com/puppetlabs-apache.git";
    let git_spec = |author: &str| BackendSpec::Git {
        author: author.to_string(),
        name: "apache".to_string(),
        source: url.to_string(),
        tag_pattern: None,
    };
    let config = ModforgeToml {
        cache: CacheSection {
            root: Some(utf8(cache.path())),
            ttl_seconds: None,
        },
        backends: vec![git_spec("puppetlabs"), git_spec("example")],
    };

    let forge = build_forge_with(&config, git.clone()).unwrap();
    let puppetlabs = ModuleIdentity::new("puppetlabs", "apache");
    let example = ModuleIdentity::new("example", "apache");
    let (a, b) = tokio::join!(forge.get_metadata(&puppetlabs), forge.get_metadata(&example));

    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 2);
    assert_eq!(git.clone_count(), 1);
    assert_eq!(git.max_concurrent_calls(), 1);
}
