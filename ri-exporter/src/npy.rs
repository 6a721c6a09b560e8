use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use ri_core::rangeimage::grid::RangeImage;
use ri_core::rangeimage::point::POINT_FIELDS;

use crate::error::WriteError;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Stores a range image as a NumPy `.npy` file: format version 1.0, C-order
/// little-endian f64 payload of shape (rings, azimuths, 6).
pub fn write_npy(path: &Path, image: &RangeImage) -> Result<(), WriteError> {
    let file = File::create(path).map_err(|source| WriteError::CreateFile {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let header = npy_header(image.rings(), image.azimuths());
    let write = |source| WriteError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    writer.write_all(NPY_MAGIC).map_err(write)?;
    writer.write_all(&[1, 0]).map_err(write)?;
    writer
        .write_u16::<LittleEndian>(header.len() as u16)
        .map_err(write)?;
    writer.write_all(&header).map_err(write)?;
    for value in image.as_slice() {
        writer.write_f64::<LittleEndian>(*value).map_err(write)?;
    }
    writer.flush().map_err(write)
}

/// Header dict, space-padded so magic + version + length + header is a
/// multiple of 64 bytes, newline-terminated.
fn npy_header(rings: usize, azimuths: usize) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}, {}), }}",
        rings, azimuths, POINT_FIELDS
    );
    let mut header = dict.into_bytes();
    let pad = (64 - (10 + header.len() + 1) % 64) % 64;
    header.extend(std::iter::repeat(b' ').take(pad));
    header.push(b'\n');
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_padded_to_a_64_byte_boundary() {
        for (rings, azimuths) in [(64, 512), (16, 512), (2, 3)] {
            let header = npy_header(rings, azimuths);
            assert_eq!((10 + header.len()) % 64, 0);
            assert_eq!(*header.last().unwrap(), b'\n');
        }
    }

    #[test]
    fn written_file_starts_with_magic_and_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npy");
        let image = RangeImage::zeros(2, 3);

        write_npy(&path, &image).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], NPY_MAGIC);
        assert_eq!(&bytes[6..8], &[1, 0]);
        let header = String::from_utf8_lossy(&bytes[10..]);
        assert!(header.contains("'shape': (2, 3, 6)"));
        assert!(header.contains("'fortran_order': False"));
        // payload: 2*3*6 f64 values after the 64-byte aligned header
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!(bytes.len() - 10 - header_len, 2 * 3 * 6 * 8);
    }
}
