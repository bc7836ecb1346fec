//! # wind-script
//!
//! A small line-oriented script language for wind processes.
//!
//! Every process spawned by a [`ScriptEngine`] gets its own [`Program`]
//! instance, parsed in full at load time. One command per line; `#` starts a
//! comment.
//!
//! ```text
//! # main.wind
//! spawn root.wind
//! spawn worker.wind
//! spawn worker.wind
//! assert nthread 4
//! send root hello
//! join
//! ```
//!
//! | Command | Effect |
//! |---|---|
//! | `log <text>` | emit an info event |
//! | `spawn <path>` | fork a process (main only) |
//! | `join` | wait for every other thread (main only) |
//! | `send <target> <text>` | `target` is an id, `self`, `root`, `main` or `workers` |
//! | `recv <count> [timeout_ms]` | receive and log messages |
//! | `echo <target> [count] [timeout_ms]` | receive and forward messages |
//! | `state new` / `state free <id>` | allocate (root only) or release a state |
//! | `assert nthread <n>` | fail unless `n` processes exist |
//! | `sleep <ms>` / `fail <text>` | pause / raise a script failure |

#![deny(warnings)]
#![deny(missing_docs)]

mod parse;
mod program;

pub use parse::{Command, DEFAULT_TIMEOUT, ParseError, Target, parse};
pub use program::{Program, ScriptEngine};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use wind_runtime::{
        CapabilitySet, ExitStatus, LoadError, ProcessId, Runtime, RuntimeConfig, Script,
        ScriptSource, SpawnError,
    };

    fn runtime() -> Runtime {
        Runtime::new(RuntimeConfig::default().with_max_workers(8), ScriptEngine::new()).unwrap()
    }

    fn run_main(runtime: &Runtime, code: &str) -> Result<(), wind_runtime::ScriptError> {
        let mut program = Program::load(&ScriptSource::inline("main", code)).unwrap();
        program.bind(CapabilitySet::MAIN);
        program.run(&mut runtime.main_context())
    }

    #[test]
    fn test_parse_error_names_script_and_line() {
        let err = Program::load(&ScriptSource::inline("boot", "log ok\nbogus")).unwrap_err();
        match err {
            LoadError::Parse {
                script,
                line,
                message,
            } => {
                assert_eq!(script, "boot");
                assert_eq!(line, 2);
                assert!(message.contains("bogus"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_spawn_load_error_starts_nothing() {
        let runtime = runtime();
        let err = runtime
            .spawn(&ScriptSource::inline("bad", "state"))
            .unwrap_err();
        assert!(matches!(err, SpawnError::Load(LoadError::Parse { .. })));
        assert_eq!(runtime.nthread(), 1);
    }

    #[test]
    fn test_root_and_workers_exchange_messages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.wind"),
            "recv 1\nstate new\nstate new\nsend workers ping\nrecv 2\nsend main done\n",
        )
        .unwrap();
        fs::write(dir.path().join("worker.wind"), "echo root\n").unwrap();
        let main = dir.path().join("main.wind");
        fs::write(
            &main,
            "spawn root.wind\nspawn worker.wind\nspawn worker.wind\n\
             assert nthread 4\nsend root go\nrecv 1\njoin\n",
        )
        .unwrap();

        let runtime = runtime();
        let mut program = Program::load(&ScriptSource::path(&main)).unwrap();
        program.bind(CapabilitySet::MAIN);
        program.run(&mut runtime.main_context()).unwrap();

        assert_eq!(runtime.states().len(), 2);
        let info = runtime.states().info(1).unwrap();
        assert_eq!(info.thread_id, ProcessId::new(2));
        assert!(runtime.join_all().is_empty());
    }

    #[test]
    fn test_failed_thread_does_not_stop_join() {
        let runtime = runtime();
        runtime.spawn(&ScriptSource::inline("root", "fail on purpose")).unwrap();
        runtime.spawn(&ScriptSource::inline("w", "log fine")).unwrap();
        run_main(&runtime, "assert nthread 3").unwrap();

        let statuses = runtime.join_all();
        assert!(matches!(&statuses[0].1, ExitStatus::Failed(m) if m.contains("on purpose")));
        assert_eq!(statuses[1].1, ExitStatus::Normal);
    }

    #[test]
    fn test_worker_cannot_allocate_states() {
        let runtime = runtime();
        runtime.spawn(&ScriptSource::inline("root", "log idle")).unwrap();
        runtime.spawn(&ScriptSource::inline("worker", "state new")).unwrap();
        let statuses = runtime.join_all();
        assert_eq!(statuses[0].1, ExitStatus::Normal);
        assert!(matches!(&statuses[1].1, ExitStatus::Failed(m) if m.contains("state new")));
        assert!(runtime.states().is_empty());
    }

    #[test]
    fn test_recv_times_out() {
        let runtime = runtime();
        runtime.spawn(&ScriptSource::inline("root", "recv 1 20")).unwrap();
        let statuses = runtime.join_all();
        assert!(matches!(&statuses[0].1, ExitStatus::Failed(m) if m.contains("timed out")));
    }

    #[test]
    fn test_assert_nthread_fails() {
        let runtime = runtime();
        let err = run_main(&runtime, "assert nthread 5").unwrap_err();
        assert!(err.to_string().contains("expected 5 threads, found 1"));
    }

    #[test]
    fn test_main_cannot_recv_without_sender_and_times_out() {
        let runtime = runtime();
        let err = run_main(&runtime, "recv 1 5").unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_send_to_missing_process_fails() {
        let runtime = runtime();
        let err = run_main(&runtime, "send 9 hello").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_free_state_twice_fails() {
        let runtime = runtime();
        runtime
            .spawn(&ScriptSource::inline(
                "root",
                "recv 1\nstate new\nstate free 1\nstate free 1",
            ))
            .unwrap();
        runtime.spawn(&ScriptSource::inline("worker", "log up")).unwrap();
        run_main(&runtime, "send root go").unwrap();
        let statuses = runtime.join_all();
        assert!(matches!(&statuses[0].1, ExitStatus::Failed(m) if m.contains("invalid state 1")));
    }
}
