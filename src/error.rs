use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot store {found} at `{key_path}`: only strings and objects are supported")]
    Structural { key_path: String, found: &'static str },

    #[error("`{key_path}` is both a file and a directory")]
    Conflict { key_path: String },

    #[error("invalid key {key:?} under `{key_path}`")]
    InvalidKey { key_path: String, key: String },

    #[error("invalid file filter: {0}")]
    FilterPattern(#[from] globset::Error),

    #[error("{} is not under {}", .path.display(), .base.display())]
    OutsideBase { base: PathBuf, path: PathBuf },

    #[error("path is not valid unicode: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("document has no string `_id`")]
    MissingId,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
