//! acme-fmt: a source formatting harness for acme windows
//!
//! Pipes a window's body through an arbitrary formatting command and writes
//! the result back, without the two annoyances of `Edit ,|fmt`:
//!
//! - the view does not jump to the top of the file: the selection in effect
//!   when the command ran is restored and scrolled into view;
//! - a formatter that fails leaves the window untouched.
//!
//! # Architecture
//!
//! One run is a format-compare-replace protocol ([`run::run`]):
//!
//! 1. capture the selection ([`buffer::read_selection`]);
//! 2. stream the body through the formatter into a staging file, counting
//!    bytes on both ends ([`formatter`], [`counting`], [`artifact`]);
//! 3. decide whether anything changed: differing counts settle it, equal
//!    counts fall back to a full streaming comparison ([`compare`]);
//! 4. only then overwrite the body as a single undo unit and restore the
//!    selection ([`replace`]).
//!
//! The staging file is removed on every path.
//!
//! # Example
//!
//! ```no_run
//! use acme_fmt::{AcmeWindow, Formatter, RunOptions};
//!
//! let mut win = AcmeWindow::open("/mnt/acme", 7)?;
//! let gofmt = Formatter::new("gofmt", Vec::<String>::new());
//! let outcome = acme_fmt::run(&mut win, &gofmt, &RunOptions::default())?;
//! println!("{outcome:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod artifact;
pub mod buffer;
pub mod compare;
pub mod config;
pub mod counting;
pub mod diff;
pub mod formatter;
pub mod replace;
pub mod run;

// Re-exports
pub use artifact::Artifact;
pub use buffer::{
    AcmeWindow, Address, BufferHandle, Ctl, HandleError, MemoryBuffer, Region, Selection,
};
pub use config::{ConfigError, Settings, TempSettings};
pub use counting::ByteCounts;
pub use formatter::{FormatError, Formatter};
pub use replace::ReplaceError;
pub use run::{run, FmtError, Outcome, RunOptions, RunOutcome};
