//! Process launching

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of one program run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Exit code, or `None` if the process was terminated by a signal
    pub code: Option<i32>,
    /// Wall time from launch to exit, redirections already in place
    pub elapsed: Duration,
}

/// Runs one program to completion.
///
/// `ProcessRunner` implements this with real child processes.
/// Tests can provide a scripted implementation.
pub trait ProgramRunner: Send + Sync {
    /// Run `argv` (program first), reading stdin from `stdin` when given and
    /// writing stdout to `stdout`. Opening those files is not part of
    /// [`Completion::elapsed`].
    fn run(&self, argv: &[String], stdin: Option<&Path>, stdout: &Path) -> io::Result<Completion>;
}

/// Launches programs with `std::process::Command`. Blocks until the child exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProgramRunner for ProcessRunner {
    fn run(&self, argv: &[String], stdin: Option<&Path>, stdout: &Path) -> io::Result<Completion> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let input = match stdin {
            Some(path) => Stdio::from(File::open(path)?),
            None => Stdio::null(),
        };
        let output = File::create(stdout)?;
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(input)
            .stdout(output)
            .stderr(Stdio::inherit());

        let start = Instant::now();
        let status = command.status()?;
        Ok(Completion {
            code: status.code(),
            elapsed: start.elapsed(),
        })
    }
}
