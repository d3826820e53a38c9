//! The format-compare-replace protocol.
//!
//! A run is a small state machine:
//!
//! ```text
//! Start -> SelectionCaptured -> Formatted -> CandidateChanged -> Finished
//!                |                  |               |
//!                +------------------+---------------+--> Finished
//! ```
//!
//! Every path ends in `Finished`, after which the staging file is removed
//! exactly once. The buffer is written only from `CandidateChanged`, and only
//! after the formatter succeeded.

use crate::artifact::Artifact;
use crate::buffer::{read_selection, BodyReader, BufferHandle, HandleError, Region, Selection};
use crate::compare;
use crate::config::TempSettings;
use crate::counting::ByteCounts;
use crate::diff;
use crate::formatter::{FormatError, Formatter};
use crate::replace::{self, ReplaceError};
use std::io::{self, Read, SeekFrom};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FmtError {
    #[error("failed to get the current selection: {0}")]
    Selection(#[source] HandleError),

    #[error("failed to create tempfile: {0}")]
    Artifact(#[source] io::Error),

    #[error("format failed: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Replace(#[from] ReplaceError),
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "Outcome reports whether the buffer was modified"]
pub enum Outcome {
    /// The formatter's output matched the body; nothing was written.
    Unchanged,
    /// The body was replaced and the selection restored.
    Replaced,
    /// The output differs but this was a dry run.
    WouldReplace,
}

/// Classification of a finished run, for the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Unchanged,
    Replaced,
    FormatterFailed,
    IoFailed,
}

impl RunOutcome {
    pub fn of(result: &Result<Outcome, FmtError>) -> Self {
        match result {
            Ok(Outcome::Unchanged) | Ok(Outcome::WouldReplace) => RunOutcome::Unchanged,
            Ok(Outcome::Replaced) => RunOutcome::Replaced,
            Err(FmtError::Format(_)) => RunOutcome::FormatterFailed,
            Err(_) => RunOutcome::IoFailed,
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Unchanged | RunOutcome::Replaced => 0,
            RunOutcome::FormatterFailed | RunOutcome::IoFailed => 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub temp: TempSettings,
    /// Stop before writing to the buffer.
    pub dry_run: bool,
    /// Print a unified diff to stderr when the content changes.
    pub diff: bool,
}

#[derive(Debug)]
enum State {
    Start,
    SelectionCaptured(Selection),
    Formatted {
        selection: Selection,
        counts: ByteCounts,
    },
    CandidateChanged(Selection),
    Finished(Result<Outcome, FmtError>),
}

struct Session<'a, B: BufferHandle + ?Sized> {
    buf: &'a mut B,
    formatter: &'a Formatter,
    options: &'a RunOptions,
    artifact: Option<Artifact>,
}

/// Format the buffer behind `buf` with `formatter`.
///
/// On any error the buffer is left as it was, except for a failure while
/// overwriting it (see [`ReplaceError::content_touched`]).
pub fn run<B: BufferHandle + ?Sized>(
    buf: &mut B,
    formatter: &Formatter,
    options: &RunOptions,
) -> Result<Outcome, FmtError> {
    let mut session = Session {
        buf,
        formatter,
        options,
        artifact: None,
    };
    let mut state = State::Start;
    let result = loop {
        state = match session.step(state) {
            State::Finished(result) => break result,
            next => next,
        };
    };
    session.cleanup();
    result
}

impl<B: BufferHandle + ?Sized> Session<'_, B> {
    fn step(&mut self, state: State) -> State {
        log::debug!("{state:?}");
        match state {
            State::Start => match read_selection(&mut *self.buf) {
                Ok(selection) => State::SelectionCaptured(selection),
                Err(e) => State::Finished(Err(FmtError::Selection(e))),
            },
            State::SelectionCaptured(selection) => match self.format() {
                Ok(counts) => State::Formatted { selection, counts },
                Err(e) => State::Finished(Err(e)),
            },
            State::Formatted { selection, counts } => match self.compare(counts) {
                Ok(true) => State::Finished(Ok(Outcome::Unchanged)),
                Ok(false) => State::CandidateChanged(selection),
                Err(e) => {
                    eprintln!("failed to compare formatted output, assuming it changed: {e}");
                    State::CandidateChanged(selection)
                }
            },
            State::CandidateChanged(selection) => State::Finished(self.replace(selection)),
            finished @ State::Finished(_) => finished,
        }
    }

    fn format(&mut self) -> Result<ByteCounts, FmtError> {
        let artifact = Artifact::create(&self.options.temp).map_err(FmtError::Artifact)?;
        let artifact = self.artifact.insert(artifact);
        let counts = self
            .formatter
            .run(BodyReader(&mut *self.buf), artifact.as_file_mut())?;
        Ok(counts)
    }

    /// Re-read the body from the start and compare it with the staged output.
    fn compare(&mut self, counts: ByteCounts) -> io::Result<bool> {
        if !counts.sizes_match() {
            return Ok(false);
        }
        let formatted = self.staged()?.reopen()?;
        self.buf.seek(Region::Body, SeekFrom::Start(0))?;
        compare::identical(BodyReader(&mut *self.buf), formatted, counts)
    }

    fn replace(&mut self, selection: Selection) -> Result<Outcome, FmtError> {
        if self.options.diff {
            match self.render_diff() {
                Ok(diff) => eprint!("{diff}"),
                Err(e) => eprintln!("failed to render diff: {e}"),
            }
        }
        if self.options.dry_run {
            return Ok(Outcome::WouldReplace);
        }
        let path = self.staged().map_err(FmtError::Artifact)?.path().to_path_buf();
        replace::apply(&mut *self.buf, &path, selection)?;
        Ok(Outcome::Replaced)
    }

    fn render_diff(&mut self) -> io::Result<String> {
        let mut formatted = Vec::new();
        self.staged()?.reopen()?.read_to_end(&mut formatted)?;
        let mut original = Vec::new();
        self.buf.seek(Region::Body, SeekFrom::Start(0))?;
        BodyReader(&mut *self.buf).read_to_end(&mut original)?;
        Ok(diff::unified(&original, &formatted))
    }

    fn staged(&self) -> io::Result<&Artifact> {
        self.artifact
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no formatted output staged"))
    }

    fn cleanup(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            let path = artifact.path().to_path_buf();
            if let Err(e) = artifact.close() {
                eprintln!("failed to remove tempfile {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Fault, MemoryBuffer};
    use std::ffi::OsString;
    use std::path::Path;

    fn options_in(dir: &Path) -> RunOptions {
        RunOptions {
            temp: TempSettings {
                dir: Some(dir.to_path_buf()),
                ..TempSettings::default()
            },
            ..RunOptions::default()
        }
    }

    fn cat() -> Formatter {
        Formatter::new("cat", Vec::<OsString>::new())
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::of(&Ok(Outcome::Unchanged)).exit_code(), 0);
        assert_eq!(RunOutcome::of(&Ok(Outcome::Replaced)).exit_code(), 0);
        assert_eq!(RunOutcome::of(&Ok(Outcome::WouldReplace)).exit_code(), 0);
        let err = FmtError::Artifact(io::Error::other("disk full"));
        assert_eq!(RunOutcome::of(&Err(err)), RunOutcome::IoFailed);
    }

    #[test]
    fn test_selection_failure_creates_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("abc").fail_on(Fault::ReadAddr);

        let result = run(&mut buf, &cat(), &options_in(dir.path()));

        assert!(matches!(result, Err(FmtError::Selection(_))));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_artifact_failure_leaves_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("abc");

        let result = run(&mut buf, &cat(), &options_in(&dir.path().join("missing")));

        assert!(matches!(result, Err(FmtError::Artifact(_))));
        assert_eq!(RunOutcome::of(&result), RunOutcome::IoFailed);
        assert_eq!(buf.body(), b"abc");
    }

    #[test]
    fn test_comparison_failure_assumes_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("abc").fail_on(Fault::SeekBody);

        let result = run(&mut buf, &cat(), &options_in(dir.path()));

        assert!(matches!(result, Ok(Outcome::Replaced)));
        assert_eq!(buf.body(), b"abc");
        assert_eq!(buf.data_writes(), 1);
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("a,b,c");
        let options = RunOptions {
            dry_run: true,
            diff: true,
            ..options_in(dir.path())
        };
        let formatter = Formatter::new("tr", [",", "\n"]);

        let result = run(&mut buf, &formatter, &options);

        assert!(matches!(result, Ok(Outcome::WouldReplace)));
        assert_eq!(buf.body(), b"a,b,c");
        assert_eq!(buf.data_writes(), 0);
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_cleanup_failure_keeps_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("abc");
        let staging = dir.path().to_str().unwrap();
        let formatter = Formatter::new("sh", ["-c", "cat; rm -f \"$1\"/*", "sh", staging]);

        let result = run(&mut buf, &formatter, &options_in(dir.path()));

        assert!(matches!(
            result,
            Err(FmtError::Replace(ReplaceError::Open(ref e))) if e.kind() == io::ErrorKind::NotFound
        ));
        assert_eq!(RunOutcome::of(&result), RunOutcome::IoFailed);
        assert_eq!(buf.body(), b"abc");
        assert_eq!(buf.data_writes(), 0);
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_unchanged_skips_write_and_keeps_marks() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = MemoryBuffer::new("hello world").with_dot(Selection::new(6, 11));

        let result = run(&mut buf, &cat(), &options_in(dir.path()));

        assert!(matches!(result, Ok(Outcome::Unchanged)));
        assert_eq!(buf.data_writes(), 0);
        assert_eq!(buf.ctl_log(), vec![crate::buffer::Ctl::AddrFromDot]);
        assert_eq!(buf.dot(), Selection::new(6, 11));
    }
}
