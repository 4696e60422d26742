#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use venvman_backend::{CreateOptions, Driver, DriverError, PackageDirective, read_pyvenv_config};
use venvman_venv::VenvDriver;

/// Stands in for a real interpreter: `-m venv DIR` lays out a minimal
/// environment, `-m pip` appends its arguments to `pip-args` and
/// `--version` answers.
const FAKE_PYTHON: &str = r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    env_dir="$3"
    mkdir -p "$env_dir/bin"
    printf 'home = /usr/bin\nversion = 3.11.4\n' > "$env_dir/pyvenv.cfg"
    cp "$0" "$env_dir/bin/python"
    shift 3
    echo "$*" > "$env_dir/venv-args"
    exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "pip" ]; then
    shift 2
    case "$*" in
        *broken-package*) echo "ERROR: No matching distribution found for broken-package" >&2; exit 1 ;;
    esac
    echo "$*" >> "$(dirname "$0")/../pip-args"
    exit 0
fi
if [ "$1" = "--version" ]; then
    echo "Python 3.11.4"
    exit 0
fi
exit 2
"#;

/// Claims success for everything without writing a file.
const NO_OP_PYTHON: &str = "#!/bin/sh\nexit 0\n";

struct Fixture {
    _temp_dir: TempDir,
    python: PathBuf,
    workon_home: PathBuf,
}

fn fixture() -> Fixture {
    fixture_with(FAKE_PYTHON)
}

fn fixture_with(script: &str) -> Fixture {
    let temp_dir = tempdir().expect("create temp dir");
    let python = temp_dir.path().join("fake-python");
    std::fs::write(&python, script).expect("write fake python");
    std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755))
        .expect("make fake python executable");
    let workon_home = temp_dir.path().join("envs");
    Fixture {
        _temp_dir: temp_dir,
        python,
        workon_home,
    }
}

fn driver(fixture: &Fixture) -> VenvDriver {
    VenvDriver::new(fixture.workon_home.clone(), None).with_default_python(fixture.python.clone())
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read recorded arguments")
}

#[tokio::test]
async fn lifecycle_creates_directory_with_pyvenv_cfg() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let expected = fixture.workon_home.join("env1");

    assert!(driver.list_environments().await.expect("list").is_empty());

    let created = driver
        .create_environment("env1", &CreateOptions::default())
        .await
        .expect("create env1");
    assert_eq!(created, Some(expected.clone()));
    assert_eq!(
        read_pyvenv_config(&expected, "version").as_deref(),
        Some("3.11.4")
    );
    assert_eq!(read(&expected.join("venv-args")).trim(), "--upgrade-deps");

    assert_eq!(
        driver.list_environments().await.expect("list"),
        vec!["env1".to_string()]
    );
    assert_eq!(
        driver.resolve_environment("env1").await.expect("resolve"),
        expected
    );

    driver.remove_environment("env1").await.expect("remove env1");
    assert!(!expected.exists());
    assert!(driver.list_environments().await.expect("list").is_empty());
}

#[tokio::test]
async fn packages_are_installed_with_one_pip_run() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let options = CreateOptions {
        packages: vec!["requests".to_string(), "attrs".to_string()],
        ..CreateOptions::default()
    };

    let created = driver
        .create_environment("env1", &options)
        .await
        .expect("create env1")
        .expect("venv always knows the path");

    assert_eq!(
        read(&created.join("pip-args")).trim(),
        "install --upgrade setuptools wheel requests attrs"
    );
}

#[tokio::test]
async fn unwanted_bootstrap_packages_are_uninstalled_after_creation() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let options = CreateOptions {
        pip: PackageDirective::Bundled,
        setuptools: PackageDirective::DoNotInstall,
        wheel: PackageDirective::DoNotInstall,
        ..CreateOptions::default()
    };

    let created = driver
        .create_environment("env1", &options)
        .await
        .expect("create env1")
        .expect("venv always knows the path");

    assert_eq!(read(&created.join("venv-args")).trim(), "");
    assert_eq!(
        read(&created.join("pip-args")).trim(),
        "uninstall --yes setuptools wheel"
    );
}

#[tokio::test]
async fn unsupported_bootstrap_directive_creates_nothing() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let options = CreateOptions {
        setuptools: PackageDirective::Bundled,
        ..CreateOptions::default()
    };

    let result = driver.create_environment("env1", &options).await;

    assert!(matches!(result, Err(DriverError::InvalidArgument(_))));
    assert!(!fixture.workon_home.join("env1").exists());
}

#[tokio::test]
async fn names_that_are_not_one_directory_are_rejected() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let outside = fixture.workon_home.with_file_name("outside");
    let names = [
        "a/b".to_string(),
        "..".to_string(),
        outside.to_string_lossy().into_owned(),
    ];

    for name in &names {
        let result = driver
            .create_environment(name, &CreateOptions::default())
            .await;

        assert!(
            matches!(result, Err(DriverError::InvalidArgument(_))),
            "{name:?} should be rejected, got {result:?}"
        );
    }
    assert!(!fixture.workon_home.join("a").exists());
    assert!(!outside.exists());
    assert!(driver.list_environments().await.expect("list").is_empty());
}

#[tokio::test]
async fn creation_that_leaves_no_environment_is_a_failure() {
    let fixture = fixture_with(NO_OP_PYTHON);
    let driver = driver(&fixture);
    let options = CreateOptions {
        pip: PackageDirective::DoNotInstall,
        setuptools: PackageDirective::DoNotInstall,
        wheel: PackageDirective::DoNotInstall,
        ..CreateOptions::default()
    };

    let result = driver.create_environment("env1", &options).await;

    assert!(matches!(
        result,
        Err(DriverError::OperationFailed { operation: "create virtual environment", ref details })
            if details.contains("env1 is not listed")
    ));
}

#[tokio::test]
async fn failed_install_discards_the_environment() {
    let fixture = fixture();
    let driver = driver(&fixture);
    let options = CreateOptions {
        packages: vec!["broken-package".to_string()],
        ..CreateOptions::default()
    };

    let result = driver.create_environment("env1", &options).await;

    assert!(matches!(
        result,
        Err(DriverError::OperationFailed { operation: "install packages", ref details })
            if details.contains("No matching distribution")
    ));
    assert!(driver.list_environments().await.expect("list").is_empty());
}

#[tokio::test]
async fn duplicate_name_is_refused() {
    let fixture = fixture();
    let driver = driver(&fixture);
    driver
        .create_environment("env1", &CreateOptions::default())
        .await
        .expect("create env1");

    let second = driver.create_environment("env1", &CreateOptions::default()).await;

    assert!(matches!(second, Err(DriverError::OperationFailed { .. })));
    assert_eq!(
        driver.list_environments().await.expect("list"),
        vec!["env1".to_string()]
    );
}

#[tokio::test]
async fn unknown_interpreter_and_project_path_are_rejected() {
    let fixture = fixture();
    let driver = driver(&fixture);

    let missing = driver
        .create_environment(
            "env1",
            &CreateOptions::default().with_python("python-that-does-not-exist-4242"),
        )
        .await;
    let with_project = driver
        .create_environment(
            "env1",
            &CreateOptions {
                project_path: Some(PathBuf::from("/src/project")),
                ..CreateOptions::default()
            },
        )
        .await;

    assert!(matches!(missing, Err(DriverError::InterpreterNotFound { .. })));
    assert!(matches!(with_project, Err(DriverError::InvalidArgument(_))));
}

#[tokio::test]
async fn directories_without_pyvenv_cfg_are_ignored() {
    let fixture = fixture();
    let driver = driver(&fixture);
    std::fs::create_dir_all(fixture.workon_home.join("not-an-env")).expect("create dir");

    assert!(driver.list_environments().await.expect("list").is_empty());
    assert!(matches!(
        driver.remove_environment("not-an-env").await,
        Err(DriverError::NotFound { .. })
    ));
    assert!(matches!(
        driver.remove_environment("").await,
        Err(DriverError::InvalidArgument(_))
    ));
}
