//! Unit tests for the upstream forge proxy

use super::*;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn apache() -> ModuleIdentity {
    ModuleIdentity::new("puppetlabs", "apache")
}

fn releases_body() -> serde_json::Value {
    serde_json::json!({
        "puppetlabs/apache": [
            {
                "file": "/modules/puppetlabs-apache-1.0.0.tar.gz",
                "version": "1.0.0",
                "dependencies": [["puppetlabs/stdlib", ">= 2.4.0"]]
            },
            {
                "file": "/modules/puppetlabs-apache-1.1.0.tar.gz",
                "version": "1.1.0",
                "dependencies": [["puppetlabs/stdlib", ">= 2.4.0"], ["puppetlabs/concat", ">= 1.0.0"]]
            }
        ],
        "puppetlabs/stdlib": [
            { "file": "/modules/puppetlabs-stdlib-4.1.0.tar.gz", "version": "4.1.0", "dependencies": [] }
        ]
    })
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn proxy(server: &MockServer) -> ProxyBackend {
    ProxyBackend::with_config(&server.uri(), fast_retry(), DEFAULT_METADATA_TTL).unwrap()
}

async fn mount_releases(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/releases.json"))
        .and(query_param("module", "puppetlabs/apache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[test]
fn test_invalid_url() {
    let err = ProxyBackend::new("not a url").unwrap_err();
    assert!(matches!(err, ForgeError::ConfigValidation { ref field, .. } if field == "url"));
}

#[test]
fn test_base_url_gets_trailing_slash() {
    let backend = ProxyBackend::new("https://forge.example.com/mirror").unwrap();
    assert_eq!(backend.base_url().as_str(), "https://forge.example.com/mirror/");
    assert_eq!(
        backend.endpoint(RELEASES_PATH).unwrap().as_str(),
        "https://forge.example.com/mirror/api/v1/releases.json"
    );
}

#[tokio::test]
async fn test_get_metadata() {
    let server = MockServer::start().await;
    mount_releases(&server, 1).await;
    let backend = proxy(&server);

    let releases = backend.get_metadata(&apache()).await.unwrap();

    let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    assert_eq!(releases[1].dependencies.len(), 2);
    assert_eq!(releases[1].dependencies[1].identity, ModuleIdentity::new("puppetlabs", "concat"));
    assert_eq!(releases[1].dependencies[1].version_requirement, ">= 1.0.0");
}

#[tokio::test]
async fn test_listing_is_cached_until_cleared() {
    let server = MockServer::start().await;
    mount_releases(&server, 2).await;
    let backend = proxy(&server);

    backend.get_metadata(&apache()).await.unwrap();
    backend.get_metadata(&apache()).await.unwrap();
    backend.clear_cache(Some(&apache())).await.unwrap();
    backend.get_metadata(&apache()).await.unwrap();
}

#[tokio::test]
async fn test_unknown_module_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/releases.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let backend = proxy(&server);

    let releases = backend
        .get_metadata(&ModuleIdentity::new("nonexistant", "nonexistant"))
        .await
        .unwrap();
    assert!(releases.is_empty());
    assert!(backend
        .get_module(&ModuleIdentity::new("nonexistant", "nonexistant"), "1.0.0")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/releases.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_releases(&server, 1).await;
    let backend = proxy(&server);

    let releases = backend.get_metadata(&apache()).await.unwrap();
    assert_eq!(releases.len(), 2);
}

#[tokio::test]
async fn test_persistent_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/releases.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    let backend = proxy(&server);

    let err = backend.get_metadata(&apache()).await.unwrap_err();
    assert!(matches!(err, ForgeError::Network { .. }));
}

#[tokio::test]
async fn test_get_module_downloads_file() {
    let server = MockServer::start().await;
    mount_releases(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/modules/puppetlabs-apache-1.1.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    let backend = proxy(&server);

    let archive = backend.get_module(&apache(), "1.1.0").await.unwrap().unwrap();
    assert_eq!(archive.file_name, "puppetlabs-apache-1.1.0.tar.gz");
    assert_eq!(archive.bytes, b"archive-bytes");

    // Unlisted version: no download attempted
    assert!(backend.get_module(&apache(), "0.0.1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_download_is_absent() {
    let server = MockServer::start().await;
    mount_releases(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/modules/puppetlabs-apache-1.0.0.tar.gz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let backend = proxy(&server);

    assert!(backend.get_module(&apache(), "1.0.0").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_all_metadata_is_empty() {
    let server = MockServer::start().await;
    let backend = proxy(&server);
    assert!(backend.get_all_metadata().await.unwrap().is_empty());
}
