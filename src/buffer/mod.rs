//! Typed access to a host-owned text buffer.
//!
//! The host exposes a window as a handful of named files: `addr` (the range
//! the next region operation applies to), `body` (current content), `data`
//! (content under `addr`, writable), and `ctl` (control directives). The
//! [`BufferHandle`] trait is the seam between the formatting protocol and a
//! concrete host; [`AcmeWindow`] talks to acme, [`MemoryBuffer`] is an
//! in-process host for tests.

pub mod acme;
pub mod errors;
pub mod memory;

pub use acme::{AcmeWindow, DEFAULT_MOUNT};
pub use errors::HandleError;
pub use memory::{Fault, MemoryBuffer, Op};

use std::fmt;
use std::io::{self, Read, SeekFrom, Write};

/// An ordered `(start, end)` offset pair into the buffer content.
///
/// Offsets are in host units: acme counts characters, [`MemoryBuffer`]
/// counts bytes. Both read and set addresses in the same units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build a selection, ordering the endpoints so `start <= end`.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{},#{}", self.start, self.end)
    }
}

/// Target of the next region operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// The whole content, `0,$`.
    All,
    Range(Selection),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::All => f.write_str("0,$"),
            Address::Range(sel) => sel.fmt(f),
        }
    }
}

/// Control directives understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ctl {
    /// Set the address to the user's selection (dot).
    AddrFromDot,
    /// Set the user's selection to the address.
    DotFromAddr,
    /// Scroll so that dot is visible.
    Show,
    /// Stop starting a new undo unit on every write.
    NoMark,
    /// Restore per-write undo units.
    Mark,
}

impl Ctl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ctl::AddrFromDot => "addr=dot",
            Ctl::DotFromAddr => "dot=addr",
            Ctl::Show => "show",
            Ctl::NoMark => "nomark",
            Ctl::Mark => "mark",
        }
    }

    /// Render directives as one control message, one per line.
    pub fn message(cmds: &[Ctl]) -> String {
        let mut msg = String::new();
        for cmd in cmds {
            msg.push_str(cmd.as_str());
            msg.push('\n');
        }
        msg
    }
}

impl fmt::Display for Ctl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named views into buffer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The whole current content.
    Body,
    /// The content under the current address; writes replace it.
    Data,
}

impl Region {
    pub fn name(&self) -> &'static str {
        match self {
            Region::Body => "body",
            Region::Data => "data",
        }
    }
}

/// A live buffer owned by an external host.
pub trait BufferHandle {
    /// Read the current address.
    fn read_addr(&mut self) -> Result<Selection, HandleError>;

    /// Set the address for subsequent region operations.
    fn set_addr(&mut self, addr: Address) -> Result<(), HandleError>;

    /// Send control directives as a single message.
    fn ctl(&mut self, cmds: &[Ctl]) -> Result<(), HandleError>;

    fn read(&mut self, region: Region, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, region: Region, buf: &[u8]) -> io::Result<usize>;

    fn seek(&mut self, region: Region, pos: SeekFrom) -> io::Result<u64>;
}

/// `io::Read` over the buffer's body.
pub struct BodyReader<'a, B: BufferHandle + ?Sized>(pub &'a mut B);

impl<B: BufferHandle + ?Sized> Read for BodyReader<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(Region::Body, buf)
    }
}

/// `io::Write` into the buffer's data region.
pub struct DataWriter<'a, B: BufferHandle + ?Sized>(pub &'a mut B);

impl<B: BufferHandle + ?Sized> Write for DataWriter<'_, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(Region::Data, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture the user's current selection.
///
/// The first address read after opening is not trustworthy: acme zeroes the
/// address when the `addr` file is first opened, which would clobber an
/// `addr=dot` issued before it. Prime with one read, then copy dot into the
/// address and read it back.
pub fn read_selection<B: BufferHandle + ?Sized>(buf: &mut B) -> Result<Selection, HandleError> {
    buf.read_addr()?;
    buf.ctl(&[Ctl::AddrFromDot])?;
    buf.read_addr()
}
