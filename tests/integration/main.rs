//! Integration tests for Vigil

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn vigil() -> Command {
        cargo_bin_cmd!("vigil")
    }

    #[test]
    fn help_displays() {
        vigil()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Upstream cache synchronizer"));
    }

    #[test]
    fn version_displays() {
        vigil()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vigil"));
    }

    #[test]
    fn run_help_lists_daemon_flag() {
        vigil()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--daemon"));
    }

    #[test]
    fn status_runs() {
        // Status reports missing tools rather than failing
        vigil()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Vigil System Status"));
    }

    #[test]
    fn config_path() {
        vigil()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_uses_defaults_when_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");

        vigil()
            .arg("--config")
            .arg(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[upstream]"));
    }

    #[test]
    fn config_init_creates_file_then_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");

        vigil()
            .arg("--config")
            .arg(&config)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized"));
        assert!(config.exists());

        vigil()
            .arg("--config")
            .arg(&config)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn run_fails_preflight_when_data_tool_is_missing() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            "[tools]\ndata = \"vigil-data-not-installed-anywhere\"\n",
        )
        .unwrap();

        vigil()
            .arg("--config")
            .arg(&config)
            .arg("run")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Required tool not found"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "not [valid toml").unwrap();

        vigil()
            .arg("--config")
            .arg(&config)
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
