use std::io;

use thiserror::Error;

use ri_core::error::GridError;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed record in '{path}' at line {line}: {reason}")]
    Record {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("'{path}' is not a supported npy file: {reason}")]
    NpyHeader { path: String, reason: String },

    #[error("'{path}' stores '{descr}' data, only little-endian f64 ('<f8') is supported")]
    UnsupportedDtype { path: String, descr: String },

    #[error(transparent)]
    Grid(#[from] GridError),
}
