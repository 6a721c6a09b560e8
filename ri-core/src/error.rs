use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    /// The number of cells does not fill a (rings, azimuths) image exactly.
    #[error(
        "shape mismatch: a {rings}x{azimuths} range image holds {expected} cells, got {actual}"
    )]
    ShapeMismatch {
        rings: usize,
        azimuths: usize,
        expected: usize,
        actual: usize,
    },

    #[error("ring index {ring} is out of range for a {rings}-ring image")]
    RingOutOfRange { ring: usize, rings: usize },
}
