use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("no color defined for class {label} (palette covers {classes} classes)")]
    UnknownClass { label: u32, classes: usize },
}
