//! Line parser.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use wind_core::ProcessId;

/// Timeout used by `recv` and `echo` when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// A malformed line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

/// Who a `send` or `echo` is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A fixed process id.
    Pid(ProcessId),
    /// The running process.
    Current,
    /// Process 1.
    Root,
    /// Every worker that exists when the command runs.
    Workers,
}

/// One parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `log <text>`
    Log(String),
    /// `spawn <path>`
    Spawn(PathBuf),
    /// `join`
    Join,
    /// `send <target> <text>`
    Send {
        /// Recipient.
        target: Target,
        /// Message text.
        text: String,
    },
    /// `recv <count> [timeout_ms]`
    Recv {
        /// Messages to receive.
        count: usize,
        /// Time allowed for each message.
        timeout: Duration,
    },
    /// `echo <target> [count] [timeout_ms]`
    Echo {
        /// Where received messages are forwarded.
        target: Target,
        /// Messages to forward.
        count: usize,
        /// Time allowed for each message.
        timeout: Duration,
    },
    /// `state new`
    StateNew,
    /// `state free <id>`
    StateFree(u32),
    /// `assert nthread <n>`
    AssertNthread(usize),
    /// `sleep <ms>`
    Sleep(Duration),
    /// `fail <text>`
    Fail(String),
}

/// Parses a whole script.
pub fn parse(text: &str) -> Result<Vec<Command>, ParseError> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(parse_line(line).map_err(|message| ParseError {
                line: line_no,
                message,
            }))
        })
        .collect()
}

fn parse_line(line: &str) -> Result<Command, String> {
    let (keyword, rest) = split_word(line);
    let command = match keyword {
        "log" => Command::Log(rest.to_string()),
        "spawn" => {
            if rest.is_empty() {
                return Err("spawn needs a script path".to_string());
            }
            Command::Spawn(PathBuf::from(rest))
        }
        "join" => {
            no_args(keyword, rest)?;
            Command::Join
        }
        "send" => {
            let (target, text) = split_word(rest);
            if text.is_empty() {
                return Err("send needs a target and a message".to_string());
            }
            Command::Send {
                target: parse_target(target)?,
                text: text.to_string(),
            }
        }
        "recv" => {
            let args = words(rest);
            match args.as_slice() {
                [count] => Command::Recv {
                    count: number(count)?,
                    timeout: DEFAULT_TIMEOUT,
                },
                [count, timeout] => Command::Recv {
                    count: number(count)?,
                    timeout: millis(timeout)?,
                },
                _ => return Err("usage: recv <count> [timeout_ms]".to_string()),
            }
        }
        "echo" => {
            let args = words(rest);
            let (target, count, timeout) = match args.as_slice() {
                [target] => (target, None, None),
                [target, count] => (target, Some(count), None),
                [target, count, timeout] => (target, Some(count), Some(timeout)),
                _ => return Err("usage: echo <target> [count] [timeout_ms]".to_string()),
            };
            Command::Echo {
                target: parse_target(target)?,
                count: count.map(|c| number(c)).transpose()?.unwrap_or(1),
                timeout: timeout.map(|t| millis(t)).transpose()?.unwrap_or(DEFAULT_TIMEOUT),
            }
        }
        "state" => match words(rest).as_slice() {
            ["new"] => Command::StateNew,
            ["free", id] => Command::StateFree(number(id)?),
            _ => return Err("usage: state new | state free <id>".to_string()),
        },
        "assert" => match words(rest).as_slice() {
            ["nthread", n] => Command::AssertNthread(number(n)?),
            _ => return Err("usage: assert nthread <n>".to_string()),
        },
        "sleep" => match words(rest).as_slice() {
            [ms] => Command::Sleep(millis(ms)?),
            _ => return Err("usage: sleep <ms>".to_string()),
        },
        "fail" => Command::Fail(rest.to_string()),
        other => return Err(format!("unknown command `{other}`")),
    };
    Ok(command)
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn words(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

fn no_args(keyword: &str, rest: &str) -> Result<(), String> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(format!("{keyword} takes no arguments"))
    }
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse().map_err(|_| format!("expected a number, found `{s}`"))
}

fn millis(s: &str) -> Result<Duration, String> {
    number(s).map(Duration::from_millis)
}

fn parse_target(s: &str) -> Result<Target, String> {
    match s {
        "self" => Ok(Target::Current),
        "root" => Ok(Target::Root),
        "workers" => Ok(Target::Workers),
        "main" => Ok(Target::Pid(ProcessId::MAIN)),
        other => number(other).map(|id| Target::Pid(ProcessId::new(id))),
    }
}
