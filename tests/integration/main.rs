//! Integration tests for buildc

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serial_test::serial;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const REPO_A: &str = "https://host/repoA";

    fn buildc() -> Command {
        let mut cmd = cargo_bin_cmd!("buildc");
        cmd.env_remove("BUILDC_CONFIG");
        cmd
    }

    /// Temp workspace with a config file and a libraries map location
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn index_path(&self) -> PathBuf {
            self.dir.path().join("libraries.json")
        }

        fn cache_root(&self) -> PathBuf {
            self.dir.path().join("cache").join("repoA")
        }

        /// Write a config declaring `repositories` (raw TOML array)
        fn write_config(&self, repositories: &str) {
            let content = format!(
                "repositories = {}\n\n[cache]\nindex_path = {:?}\nmode = \"release\"\n",
                repositories,
                self.index_path().display().to_string()
            );
            std::fs::write(self.config_path(), content).unwrap();
        }

        fn declare_repo_a(&self) {
            self.write_config(&format!(
                "[[{:?}, {:?}]]",
                REPO_A,
                self.cache_root().display().to_string()
            ));
        }

        /// Libraries map with one root holding a single release leaf
        fn write_index(&self, root: &str, revision: Option<&str>) {
            let revision = revision
                .map(|r| format!(", \"revision\": {:?}", r))
                .unwrap_or_default();
            let content = format!(
                r#"{{
  "updated_at": "2024-05-01T10:00:00Z",
  "repositories": [
    {{ "text": {:?}, "children": [
      {{ "text": "libX", "children": [
        {{ "text": "2.0", "children": [
          {{ "text": "cpu1_re_linux"{} }}
        ] }}
      ] }}
    ] }}
  ]
}}"#,
                root, revision
            );
            std::fs::write(self.index_path(), content).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = buildc();
            cmd.arg("--config").arg(self.config_path());
            cmd
        }
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn help_displays() {
        buildc()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependency cache synchronization"));
    }

    #[test]
    fn version_displays() {
        buildc()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("buildc"));
    }

    #[test]
    fn config_path_honors_flag() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    #[serial]
    fn config_path_honors_env() {
        let ws = Workspace::new();
        buildc()
            .env("BUILDC_CONFIG", ws.config_path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(ws.config_path().display().to_string()));
    }

    #[test]
    fn config_show_defaults() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("program = \"svn\""));
    }

    #[test]
    fn config_init_writes_file() {
        let ws = Workspace::new();
        ws.cmd().args(["config", "init"]).assert().success();
        assert!(read(&ws.config_path()).contains("default_root = \"~/buildc_libs\""));

        ws.cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_fails() {
        let ws = Workspace::new();
        std::fs::write(ws.config_path(), "repositories = 7").unwrap();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn list_without_index_suggests_init() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.cmd()
            .args(["cache", "list"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Libraries map not found"))
            .stderr(predicate::str::contains("buildc cache init"));
    }

    #[test]
    fn list_prints_resolved_cache_roots() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, Some("5"));

        ws.cmd()
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "libX 2.0 {}",
                ws.cache_root().display()
            )));

        ws.cmd()
            .args(["cache", "list", "--mode", "debug"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No debug libraries"));
    }

    #[test]
    fn list_json_output() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, None);

        let output = ws
            .cmd()
            .args(["cache", "list", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let libs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(libs[0]["name"], "libX");
        assert_eq!(libs[0]["version"], "2.0");
    }

    #[test]
    fn undeclared_repository_exits_with_conf_item_code() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index("https://host/repoB", None);

        ws.cmd()
            .args(["cache", "list"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("https://host/repoB"));
    }

    #[test]
    fn malformed_repository_entry_exits_with_tuple_code() {
        let ws = Workspace::new();
        ws.write_config(&format!("[[{:?}, \"/a\", \"b\", \"c\"]]", REPO_A));
        ws.write_index(REPO_A, None);

        ws.cmd()
            .args(["cache", "check"])
            .assert()
            .code(4)
            .stderr(predicate::str::contains("expected 1 to 3"));
    }

    #[test]
    fn check_passes_for_matching_map() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, None);

        ws.cmd()
            .args(["cache", "check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("matches"));
    }

    #[test]
    fn check_reports_inconsistency_with_upgrade_hint() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index("https://host/repoB", None);

        ws.cmd()
            .args(["cache", "check"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("does not exist in the libraries map"))
            .stdout(predicate::str::contains("buildc cache upgrade"))
            .stderr(predicate::str::contains("inconsistent"));
    }

    #[test]
    fn dep_for_unknown_library_fails() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, None);

        ws.cmd()
            .args(["dep", "libQ", "1.0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("libQ 1.0"));
    }

    #[cfg(unix)]
    #[test]
    fn remove_prunes_and_clears_revision() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, Some("5"));

        let leaf = ws.cache_root().join("libX").join("2.0").join("cpu1_re_linux");
        std::fs::create_dir_all(leaf.join(".svn")).unwrap();
        std::fs::write(leaf.join("libX.a"), "archive").unwrap();

        ws.cmd()
            .args(["cache", "remove", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 working copy"));

        assert!(!ws.cache_root().exists());
        assert!(!read(&ws.index_path()).contains("\"revision\""));

        ws.cmd()
            .args(["cache", "remove", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 0 working copies"));
    }

    #[test]
    fn remove_without_confirmation_keeps_cache() {
        let ws = Workspace::new();
        ws.declare_repo_a();
        ws.write_index(REPO_A, Some("5"));

        ws.cmd()
            .args(["cache", "remove"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));
        assert!(read(&ws.index_path()).contains("\"revision\""));
    }

    #[test]
    fn completions_generate() {
        buildc()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("buildc"));
    }
}
