//! End-to-end runs of script files through the public API and the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wind::{ExitStatus, RunError, RuntimeConfig, SpawnError, run_script};

fn write(dir: &Path, name: &str, code: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, code).unwrap();
    path
}

fn config() -> RuntimeConfig {
    RuntimeConfig::default().with_max_workers(4)
}

#[test]
fn test_three_spawned_threads_and_join() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.wind", "log hello\n");
    write(dir.path(), "bad.wind", "fail intentional\n");
    let main = write(
        dir.path(),
        "main.wind",
        "spawn ok.wind\nspawn bad.wind\nspawn ok.wind\nassert nthread 4\njoin\n",
    );

    let runtime = run_script(config(), &main).unwrap();
    assert_eq!(runtime.nthread(), 4);
    assert!(runtime.join_all().is_empty());
}

#[test]
fn test_join_reports_failures_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.wind", "sleep 10\n");
    write(dir.path(), "bad.wind", "fail intentional\n");
    let main = write(dir.path(), "main.wind", "spawn ok.wind\nspawn bad.wind\nspawn ok.wind\n");

    let runtime = run_script(config(), &main).unwrap();
    let statuses = runtime.join_all();
    let pids: Vec<_> = statuses.iter().map(|(pid, _)| pid.get()).collect();
    assert_eq!(pids, vec![1, 2, 3]);
    assert!(matches!(&statuses[1].1, ExitStatus::Failed(m) if m.contains("intentional")));
    assert_eq!(statuses[2].1, ExitStatus::Normal);
}

#[test]
fn test_ping_pong_between_root_and_workers() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "root.wind",
        "recv 1\nstate new\nstate new\nstate new\nsend workers ping\nrecv 3\nsend main pong\n",
    );
    write(dir.path(), "worker.wind", "echo root\n");
    let main = write(
        dir.path(),
        "main.wind",
        "spawn root.wind\nspawn worker.wind\nspawn worker.wind\nspawn worker.wind\n\
         send root start\nrecv 1\njoin\n",
    );

    let runtime = run_script(config(), &main).unwrap();
    let states = runtime.states();
    assert_eq!(states.len(), 3);
    let bound: Vec<_> = (1..=3)
        .map(|id| states.info(id).unwrap().thread_id.get())
        .collect();
    assert_eq!(bound, vec![2, 3, 4]);
}

#[test]
fn test_spawn_beyond_capacity_fails_main() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.wind", "log up\n");
    let main = write(dir.path(), "main.wind", "spawn ok.wind\nspawn ok.wind\nspawn ok.wind\n");

    let config = RuntimeConfig::default().with_max_workers(1);
    let err = run_script(config, &main).unwrap_err();
    assert!(
        matches!(&err, RunError::Script(e) if e.to_string().contains("exceeds the limit of 3")),
        "{err}"
    );
}

#[test]
fn test_missing_child_script_is_a_spawn_error() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "main.wind", "spawn missing.wind\n");
    let err = run_script(config(), &main).unwrap_err();
    match err {
        RunError::Script(wind::ScriptError::Runtime(wind::RuntimeError::Spawn(
            SpawnError::Load(_),
        ))) => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_main_script_parse_error() {
    let dir = TempDir::new().unwrap();
    let main = write(dir.path(), "main.wind", "log fine\nexplode\n");
    let err = run_script(config(), &main).unwrap_err();
    assert!(matches!(err, RunError::Load(wind::LoadError::Parse { line: 2, .. })));
}

#[test]
fn test_send_to_exited_thread() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.wind", "log bye\n");
    let main = write(dir.path(), "main.wind", "spawn ok.wind\njoin\nsend root late\n");
    let err = run_script(config(), &main).unwrap_err();
    assert!(err.to_string().contains("has exited"), "{err}");
}

fn wind_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wind"))
}

#[test]
fn test_cli_exit_codes() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "good.wind", "log hi\nassert nthread 1\n");
    let failing = write(dir.path(), "failing.wind", "fail nope\n");
    let broken = write(dir.path(), "broken.wind", "spawn\n");

    assert!(wind_bin().arg(&good).status().unwrap().success());
    assert_eq!(wind_bin().arg(&failing).status().unwrap().code(), Some(1));

    let output = wind_bin().arg(&broken).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken.wind:1"));

    assert!(!wind_bin().status().unwrap().success());
}

#[test]
fn test_cli_options() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.wind", "log up\n");
    let main = write(dir.path(), "main.wind", "spawn ok.wind\nspawn ok.wind\njoin\n");

    let status = wind_bin()
        .args(["--max-workers", "1"])
        .arg(&main)
        .status()
        .unwrap();
    assert!(status.success());

    let status = wind_bin()
        .args(["--max-workers", "0"])
        .arg(&main)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_cli_state_exhaustion_policy() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "root.wind", "recv 1\nstate new\nstate new\n");
    write(dir.path(), "worker.wind", "log up\n");
    let main = write(
        dir.path(),
        "main.wind",
        "spawn root.wind\nspawn worker.wind\nsend root go\njoin\n",
    );

    // By default the failed allocation only ends the root thread.
    let output = wind_bin()
        .args(["--max-states", "1"])
        .arg(&main)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("all 1 slots are in use"));

    let output = wind_bin()
        .args(["--max-states", "1", "--abort-on-state-exhaustion"])
        .arg(&main)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("can not allocate state"));
}
