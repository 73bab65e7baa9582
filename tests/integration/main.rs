//! Integration tests for swcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn swcache() -> Command {
        let mut cmd = cargo_bin_cmd!("swcache");
        cmd.env_remove("SWCACHE_VERSION").env_remove("SWCACHE_CONFIG");
        cmd
    }

    /// Config file with an isolated storage root and an unreachable origin
    fn write_config(dir: &Path) -> std::path::PathBuf {
        let storage = dir.join("caches");
        let path = dir.join("config.toml");
        let content = format!(
            r#"[general]
journal = false

[worker]
version = "v1"
scope = "http://127.0.0.1:9/"
manifest = ["./scannerlogo.png"]

[storage]
dir = "{}"

[network]
timeout_secs = 5
"#,
            storage.display()
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Pretend `version` was activated in an earlier run
    fn write_registration(dir: &Path, version: &str) {
        let storage = dir.join("caches");
        std::fs::create_dir_all(&storage).unwrap();
        let content = format!(
            r#"{{"active":"{}","waiting":null,"updated_at":"2025-08-25T00:00:00Z"}}"#,
            version
        );
        std::fs::write(storage.join("registration.json"), content).unwrap();
    }

    #[test]
    fn help_displays() {
        swcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("versioned offline cache manager"));
    }

    #[test]
    fn version_displays() {
        swcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swcache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[worker]"))
            .stdout(predicate::str::contains("version = \"v1\""));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["config", "set", "worker.version", "v2"])
            .assert()
            .success();

        swcache()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("version = \"v2\""));
    }

    #[test]
    fn config_set_keeps_version_override_out_of_file() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .env("SWCACHE_VERSION", "temp-override")
            .arg("--config")
            .arg(&config)
            .args(["config", "set", "network.timeout_secs", "3"])
            .assert()
            .success();

        let saved = std::fs::read_to_string(&config).unwrap();
        assert!(saved.contains("version = \"v1\""));
        assert!(!saved.contains("temp-override"));
        assert!(saved.contains("timeout_secs = 3"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["config", "set", "worker.nope", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn stores_list_empty() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["stores", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores"));

        swcache()
            .arg("--config")
            .arg(&config)
            .args(["stores", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn stores_show_missing_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["stores", "show", "assets-v0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache store not found"));
    }

    #[test]
    fn message_invalid_json_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["message", "{not json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid control message"));
    }

    #[test]
    fn message_without_waiting_version_is_noop() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["message", r#"{"type":"SKIP_WAITING"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("No waiting version"));
    }

    #[test]
    fn activate_without_install_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot activate"));
    }

    #[test]
    fn install_with_unreachable_manifest_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to populate"));

        // Nothing was registered and no store was left behind
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["stores", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn fetch_navigation_offline() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        write_registration(temp.path(), "v1");

        swcache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "http://127.0.0.1:9/", "--navigate", "-i"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("HTTP 503 Offline"))
            .stdout(predicate::str::contains("content-type: text/plain;charset=UTF-8"));
    }

    #[test]
    fn fetch_image_offline() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        write_registration(temp.path(), "v1");

        swcache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "http://127.0.0.1:9/scannerlogo.png"])
            .assert()
            .success()
            .stdout(predicate::str::diff("Offline image"));
    }

    #[test]
    fn fetch_without_active_version_hits_network() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());
        swcache()
            .arg("--config")
            .arg(&config)
            .args(["fetch", "http://127.0.0.1:9/app.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("network request"));
    }
}

mod lifecycle_tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use swcache::error::NetworkError;
    use swcache::http::{Destination, Request, RequestMode, Response};
    use swcache::lifecycle::{LifecycleManager, StaticAssetManifest, WorkerState};
    use swcache::network::{FetchOptions, Fetcher};
    use swcache::routing::Source;
    use swcache::store::{CacheStorage, MemoryStorage};
    use swcache::version::VersionTag;
    use url::Url;

    const SCOPE: &str = "https://scanner.example/";

    /// Fetcher serving a fixed body per URL; URLs in `down` fail
    #[derive(Default)]
    struct ScriptedOrigin {
        down: Mutex<HashSet<String>>,
        offline: Mutex<bool>,
    }

    impl ScriptedOrigin {
        fn fail(&self, url: &str) {
            self.down.lock().unwrap().insert(url.to_string());
        }

        fn go_offline(&self) {
            *self.offline.lock().unwrap() = true;
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedOrigin {
        async fn fetch(
            &self,
            request: &Request,
            _options: FetchOptions,
        ) -> Result<Response, NetworkError> {
            let url = request.url().to_string();
            if *self.offline.lock().unwrap() || self.down.lock().unwrap().contains(&url) {
                return Err(NetworkError::new(url, "connection refused"));
            }
            Ok(Response::new(200, Bytes::from(format!("body of {}", url))))
        }
    }

    fn manager(
        version: &str,
        storage: &Arc<MemoryStorage>,
        origin: &Arc<ScriptedOrigin>,
    ) -> LifecycleManager {
        LifecycleManager::new(
            VersionTag::new(version).unwrap(),
            &StaticAssetManifest::new(vec![
                "./scannerlogo.png".to_string(),
                "./manifest.json".to_string(),
            ]),
            &Url::parse(SCOPE).unwrap(),
            storage.clone(),
            origin.clone(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upgrade_keeps_only_new_generation() {
        let storage = Arc::new(MemoryStorage::new());
        let origin = Arc::new(ScriptedOrigin::default());

        let mut v1 = manager("v1", &storage, &origin);
        v1.transition(&|_| {}).await.unwrap();
        let router = v1.router().unwrap();
        let page = Request::get(SCOPE).unwrap().with_mode(RequestMode::Navigate);
        router.route(&page).await.unwrap();
        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["assets-v1".to_string(), "html-v1".to_string()]
        );

        let mut v2 = manager("v2", &storage, &origin);
        let transition = v2.transition(&|_| {}).await.unwrap();
        let activation = transition.activation.unwrap();
        assert_eq!(activation.deleted, vec!["assets-v1", "html-v1"]);
        assert_eq!(v2.state(), WorkerState::Activated);
        assert_eq!(storage.keys().await.unwrap(), vec!["assets-v2".to_string()]);
    }

    #[tokio::test]
    async fn failed_upgrade_leaves_previous_generation_serving() {
        let storage = Arc::new(MemoryStorage::new());
        let origin = Arc::new(ScriptedOrigin::default());

        let mut v1 = manager("v1", &storage, &origin);
        v1.transition(&|_| {}).await.unwrap();

        origin.fail("https://scanner.example/manifest.json");
        let mut v2 = manager("v2", &storage, &origin);
        assert!(v2.transition(&|_| {}).await.is_err());
        assert_eq!(v2.state(), WorkerState::Redundant);
        assert_eq!(storage.keys().await.unwrap(), vec!["assets-v1".to_string()]);

        // v1 still answers from its pre-cached assets while offline
        origin.go_offline();
        let router = v1.router().unwrap();
        let logo = Request::get("https://scanner.example/scannerlogo.png")
            .unwrap()
            .with_destination(Destination::Image);
        let routed = router.dispatch(&logo).await.unwrap();
        assert_eq!(routed.source, Source::Cache);
        assert_eq!(
            routed.response.body,
            Bytes::from("body of https://scanner.example/scannerlogo.png")
        );
        assert_eq!(
            routed.response.headers.get("x-content-type-options"),
            Some("nosniff")
        );
    }

    #[tokio::test]
    async fn repeated_activation_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let origin = Arc::new(ScriptedOrigin::default());
        storage.open("assets-v0").await.unwrap();

        let mut v1 = manager("v1", &storage, &origin);
        let first = v1.transition(&|_| {}).await.unwrap().activation.unwrap();
        assert_eq!(first.deleted, vec!["assets-v0"]);

        let second = v1.activate().await.unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(second.kept, vec!["assets-v1"]);
        assert_eq!(storage.keys().await.unwrap(), vec!["assets-v1".to_string()]);
    }

    #[tokio::test]
    async fn offline_navigation_without_cached_page() {
        let storage = Arc::new(MemoryStorage::new());
        let origin = Arc::new(ScriptedOrigin::default());

        let mut v1 = manager("v1", &storage, &origin);
        v1.transition(&|_| {}).await.unwrap();
        origin.go_offline();

        let router = v1.router().unwrap();
        let page = Request::get("https://scanner.example/never-seen")
            .unwrap()
            .with_accept("text/html");
        let response = router.route(&page).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Offline");
        assert_eq!(response.body, Bytes::from("Offline"));
    }
}
