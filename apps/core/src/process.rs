use std::fmt::{Display, Formatter};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::logging;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Lets a command that exits right at the deadline still hand over its output.
const OUTPUT_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum CommandError {
    EmptyCommand,
    Spawn { program: String, error: std::io::Error },
    Wait(std::io::Error),
    TimedOut { program: String, after: Duration },
    Failed { program: String, code: Option<i32>, stderr: String },
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCommand => write!(f, "empty command"),
            Self::Spawn { program, error } => write!(f, "failed to spawn '{program}': {error}"),
            Self::Wait(error) => write!(f, "failed to wait for command: {error}"),
            Self::TimedOut { program, after } => {
                write!(f, "'{program}' timed out after {}ms", after.as_millis())
            }
            Self::Failed {
                program,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "'{program}' exited with status {code}: {stderr}"),
                None => write!(f, "'{program}' terminated by signal: {stderr}"),
            },
        }
    }
}

impl std::error::Error for CommandError {}

impl CommandError {
    /// The program could not be started at all, typically because it is not installed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Spawn { error, .. } if error.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// `None` marks end of stream.
type Chunk = (Stream, Option<Vec<u8>>);

/// Runs `argv` to completion and returns its stdout, killing it once `timeout` elapses.
///
/// The deadline also bounds output collection: descendants that inherit the pipes and
/// outlive the command do not hold the call open.
pub fn run_with_timeout(argv: &[String], timeout: Duration) -> Result<String, CommandError> {
    let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| CommandError::Spawn {
            program: program.clone(),
            error,
        })?;

    // Drain pipes off-thread so a chatty child cannot block on a full pipe.
    let (sender, receiver) = mpsc::channel::<Chunk>();
    let mut open_streams = 0;
    if let Some(pipe) = child.stdout.take() {
        spawn_reader(pipe, Stream::Stdout, sender.clone());
        open_streams += 1;
    }
    if let Some(pipe) = child.stderr.take() {
        spawn_reader(pipe, Stream::Stderr, sender.clone());
        open_streams += 1;
    }
    drop(sender);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().map_err(CommandError::Wait)? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut {
                    program: program.clone(),
                    after: timeout,
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let collect_until = deadline.max(Instant::now() + OUTPUT_GRACE);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while open_streams > 0 {
        let remaining = collect_until.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(remaining) {
            Ok((Stream::Stdout, Some(bytes))) => stdout.extend_from_slice(&bytes),
            Ok((Stream::Stderr, Some(bytes))) => stderr.extend_from_slice(&bytes),
            Ok((_, None)) => open_streams -= 1,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                logging::debug(&format!(
                    "'{program}' exited but its output pipes stayed open; using partial output"
                ));
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    if !status.success() {
        return Err(CommandError::Failed {
            program: program.clone(),
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn spawn_reader<R>(mut pipe: R, stream: Stream, sender: Sender<Chunk>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match pipe.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    if sender.send((stream, Some(buffer[..read].to_vec()))).is_err() {
                        return;
                    }
                }
            }
        }
        let _ = sender.send((stream, None));
    });
}
