use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandleError {
    #[error("invalid window id {0:?}")]
    InvalidId(String),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {file}: {source}")]
    Io {
        file: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed address {0:?}")]
    MalformedAddr(String),
}

impl HandleError {
    pub(crate) fn io(file: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| HandleError::Io { file, source }
    }
}
