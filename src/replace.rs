//! Overwriting the buffer with formatted content and putting the user back
//! where they were.

use crate::buffer::{Address, BufferHandle, Ctl, DataWriter, HandleError, Region, Selection};
use std::fs::File;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplaceError {
    #[error("failed to open formatted output: {0}")]
    Open(#[source] io::Error),

    #[error("failed to suspend undo marks: {0}")]
    Batch(#[source] HandleError),

    #[error("failed to address the body: {0}")]
    Address(#[source] HandleError),

    #[error("failed to write the body: {0}")]
    Write(#[source] io::Error),

    #[error("failed to restore undo marks: {0}")]
    Release(#[source] HandleError),

    #[error("failed to restore the selection: {0}")]
    Restore(#[source] HandleError),
}

impl ReplaceError {
    /// Whether the body may have been modified when this error occurred.
    pub fn content_touched(&self) -> bool {
        matches!(
            self,
            ReplaceError::Write(_) | ReplaceError::Release(_) | ReplaceError::Restore(_)
        )
    }
}

/// Scope in which writes to the buffer form a single undo unit.
///
/// On entry `mark` closes the user's current undo unit and `nomark` keeps
/// the writes that follow inside the fresh one. `mark` is sent again by
/// [`NoMark::end`], or on drop if `end` was never reached.
pub struct NoMark<'a, B: BufferHandle + ?Sized> {
    buf: &'a mut B,
    armed: bool,
}

impl<'a, B: BufferHandle + ?Sized> NoMark<'a, B> {
    pub fn begin(buf: &'a mut B) -> Result<Self, HandleError> {
        buf.ctl(&[Ctl::Mark, Ctl::NoMark])?;
        Ok(Self { buf, armed: true })
    }

    pub fn end(mut self) -> Result<(), HandleError> {
        self.armed = false;
        self.buf.ctl(&[Ctl::Mark])
    }
}

impl<B: BufferHandle + ?Sized> Deref for NoMark<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &*self.buf
    }
}

impl<B: BufferHandle + ?Sized> DerefMut for NoMark<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut *self.buf
    }
}

impl<B: BufferHandle + ?Sized> Drop for NoMark<'_, B> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.buf.ctl(&[Ctl::Mark]) {
                log::warn!("failed to restore undo marks: {e}");
            }
        }
    }
}

/// Replace the whole body with the contents of `formatted`, then reselect
/// `selection`.
///
/// The offsets are reapplied verbatim. When formatting moved text around the
/// selection they may now cover different characters.
///
/// Returns the number of bytes written.
pub fn apply<B: BufferHandle + ?Sized>(
    buf: &mut B,
    formatted: &Path,
    selection: Selection,
) -> Result<u64, ReplaceError> {
    let mut src = File::open(formatted).map_err(ReplaceError::Open)?;

    let mut batch = NoMark::begin(buf).map_err(ReplaceError::Batch)?;
    let written = match overwrite(&mut *batch, &mut src) {
        Ok(written) => written,
        Err(e) => {
            if let Err(release) = batch.end() {
                log::warn!("failed to restore undo marks: {release}");
            }
            return Err(e);
        }
    };
    batch.end().map_err(ReplaceError::Release)?;
    log::debug!("wrote {written} bytes to the body");

    show_selection(buf, selection).map_err(ReplaceError::Restore)?;
    Ok(written)
}

fn overwrite<B: BufferHandle + ?Sized>(buf: &mut B, src: &mut File) -> Result<u64, ReplaceError> {
    buf.set_addr(Address::All).map_err(ReplaceError::Address)?;
    let written = io::copy(src, &mut DataWriter(&mut *buf)).map_err(ReplaceError::Write)?;
    if written == 0 {
        // Nothing was copied, so nothing has replaced the old body yet.
        buf.write(Region::Data, &[]).map_err(ReplaceError::Write)?;
    }
    Ok(written)
}

/// Make `selection` the user's selection and scroll it into view.
pub fn show_selection<B: BufferHandle + ?Sized>(
    buf: &mut B,
    selection: Selection,
) -> Result<(), HandleError> {
    buf.set_addr(Address::Range(selection))?;
    buf.ctl(&[Ctl::DotFromAddr, Ctl::Show])
}
