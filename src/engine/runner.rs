// Process runner: streams ffmpeg output and keeps a short tail for errors

use crate::engine::cancel::CancelToken;
use crate::engine::core::{EncodeOutcome, ToolError, format_command};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Lines of output kept for error reports
pub const LOG_TAIL_LINES: usize = 20;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Executes an external command line (program first).
pub trait Runner {
    fn run(&self, argv: &[String]) -> Result<EncodeOutcome, ToolError>;
}

/// Bounded buffer holding the most recent lines
#[derive(Debug, Clone)]
pub struct LogTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Runs commands as child processes.
///
/// stdout and stderr are read on two threads and funnelled into one channel,
/// so the console sees the combined stream in arrival order and neither pipe
/// can fill up and stall the child.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    tail_lines: usize,
    echo: bool,
    cancel: CancelToken,
}

impl ProcessRunner {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            tail_lines: LOG_TAIL_LINES,
            echo: true,
            cancel,
        }
    }

    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.tail_lines = lines;
        self
    }

    /// Forward child output to stdout (on by default)
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

impl Runner for ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<EncodeOutcome, ToolError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ToolError::InvalidInput("Empty command line".to_string()))?;
        self.cancel.check()?;

        if self.echo {
            println!("Running ffmpeg command:");
            println!("  {}", format_command(argv));
            println!();
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::io(format!("Failed to spawn {}", program), e))?;

        let (tx, rx) = mpsc::channel::<String>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        drop(tx);

        let mut tail = LogTail::new(self.tail_lines);
        let console = io::stdout();
        loop {
            if self.cancel.is_cancelled() {
                // Ctrl-C already reached ffmpeg through the process group;
                // this covers cancellation from the token alone.
                let _ = child.kill();
                let _ = child.wait();
                // Readers finish on their own once the pipes close.
                return Err(ToolError::Interrupted);
            }
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(line) => {
                    if self.echo {
                        let mut out = console.lock();
                        let _ = writeln!(out, "{}", line);
                        let _ = out.flush();
                    }
                    tail.push(line);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child
            .wait()
            .map_err(|e| ToolError::io(format!("Failed to wait for {}", program), e))?;
        for reader in readers {
            let _ = reader.join();
        }
        // Ctrl-C also reaches the child directly; report it as an interrupt,
        // not as an encode failure.
        self.cancel.check()?;

        let code = status.code().unwrap_or(-1);
        debug!("{} exited with {}", program, status);
        Ok(EncodeOutcome {
            code,
            tail: tail.into_lines(),
        })
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(stream: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let _ = for_each_line(&mut reader, |line| tx.send(line).is_ok());
    })
}

/// Split a byte stream into lines on `\n`, `\r` or `\r\n`.
///
/// ffmpeg redraws its progress line with bare carriage returns, so each
/// redraw counts as a line. Stops early when `on_line` returns false.
pub fn for_each_line<R: BufRead>(
    reader: &mut R,
    mut on_line: impl FnMut(String) -> bool,
) -> io::Result<()> {
    let mut pending: Vec<u8> = Vec::new();
    let mut after_cr = false;

    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break;
        }
        let consumed = buf.len();
        for &byte in buf {
            match byte {
                b'\n' if after_cr => after_cr = false,
                b'\n' | b'\r' => {
                    after_cr = byte == b'\r';
                    let line = String::from_utf8_lossy(&pending).into_owned();
                    pending.clear();
                    if !on_line(line) {
                        return Ok(());
                    }
                }
                _ => {
                    after_cr = false;
                    pending.push(byte);
                }
            }
        }
        reader.consume(consumed);
    }

    if !pending.is_empty() {
        on_line(String::from_utf8_lossy(&pending).into_owned());
    }
    Ok(())
}
