//! Integration tests for Strata

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Isolated workspace: build context, config file, cache index, journal
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let journal = dir.path().join("journal.log");
            fs::write(
                dir.path().join("config.toml"),
                format!("[general]\njournal_path = {:?}\n", journal.to_string_lossy()),
            )
            .unwrap();
            Self { dir }
        }

        fn journal_lines(&self) -> Vec<serde_json::Value> {
            fs::read_to_string(self.path("journal.log"))
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn write(&self, name: &str, content: &str) {
            fs::write(self.path(name), content).unwrap();
        }

        fn strata(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("strata");
            cmd.current_dir(self.dir.path())
                .env("STRATA_CONFIG", self.path("config.toml"))
                .env("STRATA_CACHE_DIR", self.path("cache"));
            cmd
        }
    }

    const TWO_LAYERS: &str = r#"
[[layer]]
instruction = "cat requirements.txt"
files = ["requirements.txt"]

[[layer]]
instruction = "cat app.py"
files = ["app.py"]
"#;

    fn two_layer_workspace() -> Workspace {
        let ws = Workspace::new();
        ws.write("Strata.toml", TWO_LAYERS);
        ws.write("requirements.txt", "flask==3.0\n");
        ws.write("app.py", "print('hi')\n");
        ws
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("strata")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Incremental build-layer cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("strata")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }

    #[test]
    fn plan_on_empty_cache_executes_everything() {
        let ws = two_layer_workspace();
        ws.strata()
            .args(["plan", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 execute"))
            .stdout(predicate::str::contains("2 execute"));
    }

    #[test]
    fn plan_table_summary() {
        let ws = two_layer_workspace();
        ws.strata()
            .arg("plan")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "2 layer(s): 0 reuse, 2 execute (0% cached)",
            ));
    }

    #[test]
    fn plan_missing_build_file() {
        let ws = Workspace::new();
        ws.strata()
            .args(["plan", "-f", "missing.toml"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Build file not found"));
    }

    #[test]
    fn plan_duplicate_positions() {
        let ws = Workspace::new();
        ws.write(
            "Strata.toml",
            "[[layer]]\nposition = 1\ninstruction = \"a\"\n\n[[layer]]\nposition = 1\ninstruction = \"b\"\n",
        );
        ws.strata()
            .arg("plan")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Duplicate layer position 1"));
    }

    #[cfg(unix)]
    #[test]
    fn second_build_reuses_every_layer() {
        let ws = two_layer_workspace();

        ws.strata()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("2 executed, 0 reused"));

        ws.strata()
            .arg("build")
            .assert()
            .success()
            .stdout(predicate::str::contains("0 executed, 2 reused"));

        let journal = ws.journal_lines();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0]["event"], "build.completed");
        assert_eq!(journal[1]["data"]["reused"], 2);
    }

    #[cfg(unix)]
    #[test]
    fn source_change_rebuilds_only_later_layer() {
        let ws = two_layer_workspace();
        ws.strata().arg("build").assert().success();

        ws.write("app.py", "print('changed')\n");

        ws.strata()
            .args(["plan", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 reuse"))
            .stdout(predicate::str::contains("2 execute"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_layer_reports_position() {
        let ws = Workspace::new();
        ws.write(
            "Strata.toml",
            "[[layer]]\ninstruction = \"true\"\n\n[[layer]]\ninstruction = \"exit 3\"\n",
        );
        ws.strata()
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Layer 2 failed"));

        let journal = ws.journal_lines();
        assert_eq!(journal[0]["event"], "build.failed");
        assert_eq!(journal[0]["data"]["position"], 2);

        // The first layer was cached before the failure
        ws.strata()
            .args(["plan", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 reuse"));
    }

    #[cfg(unix)]
    #[test]
    fn cache_list_and_clear() {
        let ws = two_layer_workspace();
        ws.strata().arg("build").assert().success();

        ws.strata()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total: 2 layer(s)"));

        ws.strata()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared 2"));

        ws.strata()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached layers found"));
    }

    #[test]
    fn cache_path_honours_override() {
        let ws = Workspace::new();
        ws.strata()
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));
    }

    #[test]
    fn cache_gc_dry_run() {
        let ws = Workspace::new();
        ws.strata()
            .args(["cache", "gc", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached layers older than 30 days"));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.strata()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.strata()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("journal_path"));
    }

    #[test]
    fn config_set_unknown_key() {
        let ws = Workspace::new();
        ws.strata()
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }
}
