//! Integration tests for Shelter

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// A built site, a config pointing at it and a private state directory
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let site = dir.path().join("site");
            for (file, body) in [
                ("index.html", "<html>home</html>"),
                ("offline.html", "<html>offline</html>"),
                ("static/js/bundle.js", "console.log('app')"),
                ("static/css/main.css", "body{}"),
                ("manifest.json", "{}"),
                ("favicon.ico", "ico"),
                ("img/hero.png", "png"),
            ] {
                let path = site.join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, body).unwrap();
            }

            let config = format!(
                r#"
[cache]
manifest = ["/", "/index.html", "/static/js/bundle.js", "/static/css/main.css", "/manifest.json", "/favicon.ico", "/offline.html"]

[origin]
site_dir = "{}"
"#,
                site.display().to_string().replace('\\', "/")
            );
            fs::write(dir.path().join("config.toml"), config).unwrap();

            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn shelter(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("shelter");
            cmd.env("SHELTER_CONFIG", self.path().join("config.toml"))
                .env("SHELTER_STATE_DIR", self.path().join("state"))
                .env("CI", "1");
            cmd
        }

        fn install(&self) {
            self.shelter()
                .arg("install")
                .assert()
                .success()
                .stdout(predicate::str::contains("v2.0 is active"));
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("shelter")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline asset caching controller"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("shelter")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shelter"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .shelter()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .shelter()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("/offline.html"));
    }

    #[test]
    fn partitions_list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .shelter()
            .args(["partitions", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache partitions found"));
    }

    #[test]
    fn fetch_before_install_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .shelter()
            .args(["fetch", "/"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No active controller version"))
            .stderr(predicate::str::contains("shelter install"));
    }

    #[test]
    fn install_creates_current_partitions() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["partitions", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("portfolio-static-v2.0"))
            .stdout(predicate::str::contains("portfolio-dynamic-v2.0"));

        sandbox
            .shelter()
            .args(["partitions", "show", "portfolio-static-v2.0", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/static/css/main.css"));
    }

    #[test]
    fn install_fails_on_missing_asset() {
        let sandbox = Sandbox::new();
        fs::remove_file(sandbox.path().join("site").join("manifest.json")).unwrap();

        sandbox
            .shelter()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("/manifest.json"));

        sandbox
            .shelter()
            .args(["partitions", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("portfolio-static-v2.0").not());
    }

    #[test]
    fn offline_requests_served_from_cache() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["fetch", "/", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));

        sandbox
            .shelter()
            .args(["fetch", "/index.html?utm=push", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("offline fallback"));

        sandbox
            .shelter()
            .args(["fetch", "/img/other.png", "--offline"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no cached fallback"));
    }

    #[test]
    fn image_cached_after_first_fetch() {
        let sandbox = Sandbox::new();
        sandbox.install();

        let out = sandbox.path().join("hero.png");
        sandbox
            .shelter()
            .args(["fetch", "/img/hero.png", "--output"])
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("network"));
        assert_eq!(fs::read(&out).unwrap(), b"png");

        sandbox
            .shelter()
            .args(["fetch", "/img/hero.png", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn post_is_not_intercepted() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["fetch", "-X", "POST", "/index.html"])
            .assert()
            .success()
            .stdout(predicate::str::contains("not intercepted"));
    }

    #[test]
    fn push_prints_notification() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["push", "New project posted"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"body\": \"New project posted\""))
            .stdout(predicate::str::contains("explore"));

        sandbox
            .shelter()
            .args(["click", "--action", "explore"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"open_window\": \"/\""));
    }

    #[test]
    fn new_version_rotates_partitions() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["install", "v3.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("v3.0 is active"));

        sandbox
            .shelter()
            .args(["partitions", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("portfolio-static-v3.0"))
            .stdout(predicate::str::contains("v2.0").not());
    }

    #[test]
    fn partitions_clear_with_yes() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["partitions", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 2 partition(s)"));
    }

    #[test]
    fn install_after_clear_precaches_again() {
        let sandbox = Sandbox::new();
        sandbox.install();

        sandbox
            .shelter()
            .args(["partitions", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shelter install"));

        sandbox.install();

        sandbox
            .shelter()
            .args(["partitions", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("portfolio-static-v2.0"));

        sandbox
            .shelter()
            .args(["fetch", "/", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let sandbox = Sandbox::new();
        fs::write(
            sandbox.path().join("config.toml"),
            "[origin]\nbase_url = \"localhost\"\n",
        )
        .unwrap();

        sandbox
            .shelter()
            .args(["status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("origin.base_url"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("shelter")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shelter"));
    }
}
