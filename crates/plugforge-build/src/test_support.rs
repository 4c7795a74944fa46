//! Fake toolchain and plugin trees shared by the unit tests

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Answers `run ... <pkg> info` with `<pkg>/info.json`, creates the `-o`
/// file for `build`, and appends every call to `calls.log` next to itself.
const FAKE_TOOLCHAIN: &str = r#"#!/bin/sh
echo "$PWD|$*|$GOOS|$GOARCH|$CGO_ENABLED|$GOPRIVATE" >> "$(dirname "$0")/calls.log"
case "$1" in
  run)
    prev=""
    for arg in "$@"; do
      [ "$arg" = "info" ] && break
      prev="$arg"
    done
    if [ -f "$prev/info.json" ]; then
      cat "$prev/info.json"
    else
      echo "cannot load package $prev" >&2
      exit 1
    fi
    ;;
  build)
    [ "$2" = "-o" ] || exit 2
    : > "$3"
    ;;
  mod)
    ;;
  *)
    exit 2
    ;;
esac
"#;

pub(crate) fn fake_toolchain(dir: &Path) -> PathBuf {
    let path = dir.join("fake-go");
    assert!(fs::write(&path, FAKE_TOOLCHAIN).is_ok());
    assert!(fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).is_ok());
    path
}

pub(crate) fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub(crate) fn info_json(name: &str) -> String {
    format!(
        r#"{{"name":"{name}","description":"{name} commands","version":"v0.1.0","buildSHA":"abc123","group":"Run","completionType":0}}"#
    )
}

/// Create `<root>/<dir_name>` holding a plugin that reports `name`
pub(crate) fn write_plugin(
    root: &Path,
    dir_name: &str,
    name: &str,
    with_test: bool,
    with_readme: bool,
) -> PathBuf {
    let dir = root.join(dir_name);
    assert!(fs::create_dir_all(&dir).is_ok());
    assert!(fs::write(dir.join("main.go"), "package main\n").is_ok());
    assert!(fs::write(dir.join("info.json"), info_json(name)).is_ok());
    if with_test {
        assert!(fs::create_dir_all(dir.join("test")).is_ok());
        assert!(fs::write(dir.join("test").join("main.go"), "package main\n").is_ok());
    }
    if with_readme {
        assert!(fs::write(dir.join("README.md"), format!("# {name}\n")).is_ok());
    }
    dir
}
