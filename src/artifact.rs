//! Staging file for formatter output.

use crate::config::TempSettings;
use std::env;
use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Holds what the buffer should become, for the duration of one run.
///
/// Written once by the formatter, reopened for comparison and for the final
/// write. [`Artifact::close`] removes it and reports failure; dropping an
/// unclosed artifact removes it silently.
#[derive(Debug)]
pub struct Artifact {
    file: NamedTempFile,
}

impl Artifact {
    pub fn create(settings: &TempSettings) -> io::Result<Self> {
        let dir = settings.dir.clone().unwrap_or_else(env::temp_dir);
        let file = tempfile::Builder::new()
            .prefix(&settings.prefix)
            .tempfile_in(dir)?;
        log::debug!("staging formatter output in {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The write side, positioned wherever the last write left it.
    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// A fresh read handle starting at offset 0.
    pub fn reopen(&self) -> io::Result<File> {
        File::open(self.file.path())
    }

    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }
}
