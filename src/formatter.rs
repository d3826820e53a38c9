//! Running the external formatting command.
//!
//! The buffer content is streamed into the child's stdin and the child's
//! stdout is streamed into the staging file; stderr is passed through. Both
//! ends are counted so the caller can tell "sizes differ" for free.

use crate::counting::{ByteCounts, CountingReader, CountingWriter};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("failed to stream the body to {program}: {source}")]
    Input {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to collect output of {program}: {source}")]
    Output {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush formatted output: {0}")]
    Flush(#[source] io::Error),
}

/// An external command that reads content on stdin and writes the formatted
/// result on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    program: OsString,
    args: Vec<OsString>,
}

impl Formatter {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `cmd args...`. `None` when `argv` is empty or names an empty program.
    pub fn from_argv(argv: &[OsString]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Pipe `input` through the command into `output`.
    ///
    /// `input` is only ever read. The child's stdout is drained on a helper
    /// thread while this thread feeds stdin, so a command that writes before
    /// it has consumed its input cannot wedge on a full pipe.
    pub fn run<R: Read>(&self, input: R, output: &mut File) -> Result<ByteCounts, FormatError> {
        let program = self.name();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: program.clone(),
                source,
            })?;
        log::debug!("spawned {} (pid {})", program, child.id());

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let mut reader = CountingReader::new(input);
        let mut writer = CountingWriter::new(&mut *output);

        let (fed, drained) = thread::scope(|scope| {
            let drain = scope.spawn(|| match stdout {
                Some(mut stdout) => io::copy(&mut stdout, &mut writer),
                None => Ok(0),
            });
            let fed = match stdin {
                Some(mut stdin) => io::copy(&mut reader, &mut stdin),
                None => Ok(0),
            };
            let drained = drain
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("output reader panicked")));
            (fed, drained)
        });

        let status = child.wait().map_err(|source| FormatError::Output {
            program: program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(FormatError::Exit { program, status });
        }
        match fed {
            // The command is free to stop reading once it has what it needs.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(source) => return Err(FormatError::Input { program, source }),
            Ok(_) => {}
        }
        drained.map_err(|source| FormatError::Output {
            program: program.clone(),
            source,
        })?;
        writer.flush().map_err(FormatError::Flush)?;

        let counts = ByteCounts {
            read: reader.count(),
            written: writer.count(),
        };
        log::debug!(
            "{} read {} bytes, wrote {} bytes",
            program,
            counts.read,
            counts.written
        );
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;

    fn sh(script: &str) -> Formatter {
        Formatter::new("sh", ["-c", script])
    }

    fn run_to_string(formatter: &Formatter, input: &str) -> (Result<ByteCounts, FormatError>, String) {
        let mut out = tempfile::tempfile().unwrap();
        let result = formatter.run(input.as_bytes(), &mut out);
        out.rewind().unwrap();
        let mut text = String::new();
        out.read_to_string(&mut text).unwrap();
        (result, text)
    }

    #[test]
    fn test_from_argv() {
        let argv: Vec<OsString> = vec!["gofmt".into(), "-s".into()];
        let formatter = Formatter::from_argv(&argv).unwrap();
        assert_eq!(formatter.program(), "gofmt");
        assert_eq!(formatter.args(), &[OsString::from("-s")]);

        assert!(Formatter::from_argv(&[]).is_none());
        assert!(Formatter::from_argv(&[OsString::new()]).is_none());
    }

    #[test]
    fn test_identity_counts_match() {
        let (result, text) = run_to_string(&Formatter::new("cat", Vec::<OsString>::new()), "package main\n");
        let counts = result.unwrap();
        assert_eq!(text, "package main\n");
        assert_eq!(counts, ByteCounts { read: 13, written: 13 });
    }

    #[test]
    fn test_transform_counts_differ() {
        let (result, text) = run_to_string(&sh("tr -d ,"), "a,b,c");
        let counts = result.unwrap();
        assert_eq!(text, "abc");
        assert_eq!(counts.read, 5);
        assert_eq!(counts.written, 3);
        assert!(!counts.sizes_match());
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let (result, _) = run_to_string(&sh("cat >/dev/null; exit 3"), "abc");
        assert!(matches!(result, Err(FormatError::Exit { .. })));
    }

    #[test]
    fn test_exit_without_reading_input() {
        // A large body and a command that never reads stdin: the broken pipe
        // must not mask the exit status.
        let big = "x".repeat(1 << 20);
        let (result, _) = run_to_string(&sh("exit 1"), &big);
        assert!(matches!(result, Err(FormatError::Exit { .. })));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let formatter = Formatter::new("acme-fmt-no-such-formatter", Vec::<OsString>::new());
        let (result, _) = run_to_string(&formatter, "abc");
        assert!(matches!(result, Err(FormatError::Spawn { .. })));
    }

    #[test]
    fn test_large_streaming_does_not_deadlock() {
        let big = "line of text\n".repeat(50_000);
        let (result, text) = run_to_string(&Formatter::new("cat", Vec::<OsString>::new()), &big);
        let counts = result.unwrap();
        assert_eq!(counts.read, big.len() as u64);
        assert_eq!(counts.written, big.len() as u64);
        assert_eq!(text.len(), big.len());
    }

    #[test]
    fn test_input_read_error_reported() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("body unreadable"))
            }
        }

        let mut out = tempfile::tempfile().unwrap();
        let result = Formatter::new("cat", Vec::<OsString>::new()).run(Broken, &mut out);
        assert!(matches!(result, Err(FormatError::Input { .. })));
    }
}
