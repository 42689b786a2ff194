use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

use uaview_testkit::{fixture_path as shared_fixture_path, target_dir as workspace_target_dir};

static UAVIEW_BIN: OnceLock<PathBuf> = OnceLock::new();

pub(crate) fn fixture_path(name: &str) -> PathBuf {
	shared_fixture_path(name)
}

pub(crate) fn run_uaview(args: &[&str]) -> Output {
	Command::new(uaview_bin()).args(args).env_remove("RUST_LOG").output().expect("uaview command executes")
}

pub(crate) fn run_uaview_json(args: &[&str]) -> serde_json::Value {
	let output = run_uaview(args);
	assert!(
		output.status.success(),
		"uaview command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn uaview_bin() -> &'static PathBuf {
	UAVIEW_BIN.get_or_init(resolve_uaview_bin)
}

fn resolve_uaview_bin() -> PathBuf {
	if let Ok(path) = std::env::var("CARGO_BIN_EXE_uaview") {
		return PathBuf::from(path);
	}

	let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	let target_dir = workspace_target_dir();

	let mut bin = target_dir.join("debug");
	bin.push(if cfg!(windows) { "uaview.exe" } else { "uaview" });

	let status = Command::new("cargo")
		.current_dir(&manifest_dir)
		.args(["build", "--quiet", "--bin", "uaview"])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build uaview binary at {}", bin.display());

	bin
}
