use std::io::Write;
use std::sync::Mutex;

/// Runner actions understood by the Guard console, one line each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    RunAll,
    Stop,
    Reload,
    Help,
    ToggleNotifications,
    Pause,
}

impl ControlCommand {
    pub const ALL: [ControlCommand; 6] = [
        ControlCommand::RunAll,
        ControlCommand::Stop,
        ControlCommand::Reload,
        ControlCommand::Help,
        ControlCommand::ToggleNotifications,
        ControlCommand::Pause,
    ];

    /// Wire token including the terminating newline.
    pub fn token(self) -> &'static str {
        match self {
            ControlCommand::RunAll => "\n",
            ControlCommand::Stop => "e\n",
            ControlCommand::Reload => "r\n",
            ControlCommand::Help => "h\n",
            ControlCommand::ToggleNotifications => "n\n",
            ControlCommand::Pause => "p\n",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlCommand::RunAll => "run-all",
            ControlCommand::Stop => "stop",
            ControlCommand::Reload => "reload",
            ControlCommand::Help => "help",
            ControlCommand::ToggleNotifications => "toggle-notifications",
            ControlCommand::Pause => "pause",
        }
    }
}

#[derive(Debug)]
pub enum ControlError {
    Write {
        command: ControlCommand,
        error: std::io::Error,
    },
    Poisoned,
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::Write { command, error } => write!(
                f,
                "failed sending `{}` to guard (has it exited?): {error}",
                command.label()
            ),
            ControlError::Poisoned => write!(f, "guard input pipe lock was poisoned"),
        }
    }
}

impl std::error::Error for ControlError {}

/// Single-writer wrapper around the runner's input stream.
///
/// Each send holds the lock across the write and the flush, so tokens from
/// concurrent callers never interleave.
#[derive(Debug)]
pub struct ControlPipe<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> ControlPipe<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn send(&self, command: ControlCommand) -> Result<(), ControlError> {
        let mut writer = self.writer.lock().map_err(|_| ControlError::Poisoned)?;
        writer
            .write_all(command.token().as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|error| ControlError::Write { command, error })
    }

    pub fn into_inner(self) -> Result<W, ControlError> {
        self.writer.into_inner().map_err(|_| ControlError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, Default)]
    struct RecordingWriter {
        writes: Vec<Vec<u8>>,
        flushes: usize,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tokens_match_guard_console_protocol() {
        let tokens = ControlCommand::ALL
            .iter()
            .map(|command| command.token())
            .collect::<Vec<&str>>();
        assert_eq!(tokens, vec!["\n", "e\n", "r\n", "h\n", "n\n", "p\n"]);
    }

    #[test]
    fn each_send_writes_one_token_and_flushes_once() {
        let pipe = ControlPipe::new(RecordingWriter::default());
        for command in ControlCommand::ALL {
            pipe.send(command).expect("send");
        }
        let writer = pipe.into_inner().expect("writer");
        assert_eq!(writer.flushes, ControlCommand::ALL.len());
        let written = writer.writes.concat();
        assert_eq!(written, b"\ne\nr\nh\nn\np\n");
    }

    #[test]
    fn broken_pipe_is_surfaced() {
        let pipe = ControlPipe::new(ClosedPipe);
        let err = pipe.send(ControlCommand::Reload).expect_err("closed pipe");
        match err {
            ControlError::Write { command, error } => {
                assert_eq!(command, ControlCommand::Reload);
                assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn concurrent_sends_never_interleave_tokens() {
        let pipe = Arc::new(ControlPipe::new(RecordingWriter::default()));
        let handles = (0..8)
            .map(|i| {
                let pipe = pipe.clone();
                thread::spawn(move || {
                    let command = if i % 2 == 0 {
                        ControlCommand::Reload
                    } else {
                        ControlCommand::Pause
                    };
                    for _ in 0..50 {
                        pipe.send(command).expect("send");
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().expect("join");
        }
        let pipe = Arc::try_unwrap(pipe).expect("sole owner");
        let writer = pipe.into_inner().expect("writer");
        let text = String::from_utf8(writer.writes.concat()).expect("utf8");
        assert_eq!(writer.flushes, 400);
        assert!(text.lines().all(|line| line == "r" || line == "p"));
        assert_eq!(text.lines().count(), 400);
    }
}
