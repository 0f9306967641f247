//! Integration tests for Kiln

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn kiln() -> Command {
        let mut cmd = cargo_bin_cmd!("kiln");
        cmd.env_remove("KILN_CONFIG");
        cmd
    }

    /// A small extension project whose collaborators are plain shell tools
    fn project(compiler: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/popup/index.tsx", r#"<div className="p-4" />"#);
        write(root, "src/index.html", "<html></html>");
        write(root, "src/content/redux.scss", ".a { color: red }");
        write(root, "public/manifest.json", "{}");
        write(root, "public/icons/16.png", "png");
        write(
            root,
            "kiln.toml",
            &format!(
                "[compiler]\nprogram = \"{compiler}\"\nargs = []\n\n[styles]\nprogram = \"cp\"\nargs = []\n"
            ),
        );
        temp
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn help_displays() {
        kiln()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("asset build orchestrator"));
    }

    #[test]
    fn version_displays() {
        kiln()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }

    #[test]
    fn unknown_environment_fails_before_building() {
        let temp = project("true");
        kiln()
            .args(["-C"])
            .arg(temp.path())
            .args(["build", "qa"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown build environment: qa"))
            .stderr(predicate::str::contains("dev, stage, prod"));
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn invalid_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "kiln.toml", "[project\nout_dir = ");
        kiln()
            .arg("-C")
            .arg(temp.path())
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn missing_project_dir_fails() {
        let temp = TempDir::new().unwrap();
        kiln()
            .arg("-C")
            .arg(temp.path().join("nope"))
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Project directory not found"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[project]"))
            .stdout(predicate::str::contains("static_dir = \"public\""));
    }

    #[test]
    fn config_init_then_path() {
        let temp = TempDir::new().unwrap();
        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["config", "init"])
            .assert()
            .success();
        assert!(temp.path().join("kiln.toml").exists());

        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln.toml"));
    }

    #[test]
    fn cache_show_empty() {
        let temp = TempDir::new().unwrap();
        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No class usage recorded"));
    }

    #[cfg(unix)]
    #[test]
    fn full_build_copies_and_reports() {
        let temp = project("true");
        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["build", "prod"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Built 5 modules"))
            .stdout(predicate::str::contains("manifest.json"));

        let dist = temp.path().join("dist");
        assert!(dist.join("index.html").exists());
        assert!(dist.join("manifest.json").exists());
        assert!(dist.join("icons/16.png").exists());
        assert!(dist.join("redux.css").exists());

        kiln()
            .arg("-C")
            .arg(temp.path())
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("src/popup/index.tsx"));
    }

    #[cfg(unix)]
    #[test]
    fn compiler_failure_exits_nonzero() {
        let temp = project("false");
        kiln()
            .arg("-C")
            .arg(temp.path())
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with an error"));
        assert!(!temp.path().join("dist/manifest.json").exists());
    }
}
