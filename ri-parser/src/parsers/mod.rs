use std::path::Path;

use ri_core::rangeimage::grid::RangeImage;

use crate::error::ParseError;

pub mod npy;
pub mod text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Txt,
    Npy,
}

pub fn get_extension(extension: &str) -> Option<Extension> {
    match extension {
        "txt" => Some(Extension::Txt),
        "npy" => Some(Extension::Npy),
        _ => None,
    }
}

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

/// Decodes one file into a range image. Parsers are shared across worker
/// threads, one file per call.
pub trait Parser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<RangeImage, ParseError>;
}
