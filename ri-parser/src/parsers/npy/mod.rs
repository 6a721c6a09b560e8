use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use ri_core::error::GridError;
use ri_core::rangeimage::grid::RangeImage;
use ri_core::rangeimage::point::POINT_FIELDS;

use super::{Parser, ParserProvider};
use crate::error::ParseError;

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

pub struct NpyParserProvider {
    /// When set, a decoded image whose (rings, azimuths) differs is rejected.
    pub expected_shape: Option<(usize, usize)>,
}

impl ParserProvider for NpyParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(NpyParser {
            expected_shape: self.expected_shape,
        })
    }
}

/// NumPy `.npy` reader for little-endian f64 arrays, format versions 1.0 and
/// 2.0. Accepts rank 3 (rings, azimuths, 6) grids and rank 2 (rings,
/// azimuths) label maps; the latter decode into a grid whose label channel
/// carries the stored values.
pub struct NpyParser {
    pub expected_shape: Option<(usize, usize)>,
}

impl Parser for NpyParser {
    fn parse(&self, path: &Path) -> Result<RangeImage, ParseError> {
        let file = File::open(path).map_err(|source| io_error(path, source))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 6];
        reader
            .read_exact(&mut magic)
            .map_err(|source| io_error(path, source))?;
        if &magic != NPY_MAGIC {
            return Err(header_error(path, "bad magic bytes"));
        }

        let major = reader.read_u8().map_err(|source| io_error(path, source))?;
        let _minor = reader.read_u8().map_err(|source| io_error(path, source))?;
        let header_len = match major {
            1 => reader
                .read_u16::<LittleEndian>()
                .map_err(|source| io_error(path, source))? as usize,
            2 => reader
                .read_u32::<LittleEndian>()
                .map_err(|source| io_error(path, source))? as usize,
            other => {
                return Err(header_error(
                    path,
                    format!("unsupported format version {}.x", other),
                ))
            }
        };

        let mut header = vec![0u8; header_len];
        reader
            .read_exact(&mut header)
            .map_err(|source| io_error(path, source))?;
        let header = String::from_utf8(header)
            .map_err(|_| header_error(path, "header is not valid UTF-8"))?;

        let descr = parse_descr(&header).ok_or_else(|| header_error(path, "missing 'descr'"))?;
        if descr != "<f8" {
            return Err(ParseError::UnsupportedDtype {
                path: path.display().to_string(),
                descr,
            });
        }
        if header.contains("'fortran_order': True") {
            return Err(header_error(path, "Fortran-order arrays are not supported"));
        }

        let dims = parse_shape(&header, path)?;
        let count: usize = dims.iter().product();
        let mut data = vec![0.0f64; count];
        reader
            .read_f64_into::<LittleEndian>(&mut data)
            .map_err(|source| io_error(path, source))?;

        let image = match dims.as_slice() {
            [rings, azimuths, fields] if *fields == POINT_FIELDS => {
                RangeImage::from_raw(*rings, *azimuths, data)?
            }
            [rings, azimuths] => {
                let mut image = RangeImage::zeros(*rings, *azimuths);
                for (cell, label) in image.cells_mut().zip(data) {
                    cell[POINT_FIELDS - 1] = label;
                }
                image
            }
            other => {
                return Err(header_error(
                    path,
                    format!("unsupported array shape {:?}", other),
                ))
            }
        };

        if let Some((rings, azimuths)) = self.expected_shape {
            if image.rings() != rings || image.azimuths() != azimuths {
                return Err(ParseError::Grid(GridError::ShapeMismatch {
                    rings,
                    azimuths,
                    expected: rings * azimuths,
                    actual: image.point_count(),
                }));
            }
        }
        Ok(image)
    }
}

fn io_error(path: &Path, source: io::Error) -> ParseError {
    ParseError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn header_error(path: &Path, reason: impl Into<String>) -> ParseError {
    ParseError::NpyHeader {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn parse_descr(header: &str) -> Option<String> {
    let rest = &header[header.find("'descr'")? + "'descr'".len()..];
    let rest = &rest[rest.find(':')? + 1..];
    let rest = &rest[rest.find('\'')? + 1..];
    Some(rest[..rest.find('\'')?].to_string())
}

fn parse_shape(header: &str, path: &Path) -> Result<Vec<usize>, ParseError> {
    let start = header
        .find('(')
        .ok_or_else(|| header_error(path, "missing shape tuple"))?;
    let end = header[start..]
        .find(')')
        .map(|offset| start + offset)
        .ok_or_else(|| header_error(path, "unterminated shape tuple"))?;

    header[start + 1..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|e| header_error(path, format!("bad shape dimension '{}': {}", dim, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use byteorder::WriteBytesExt as _;
    use ri_core::rangeimage::point::Point;
    use ri_exporter::npy::write_npy;

    use super::*;

    fn parser(expected_shape: Option<(usize, usize)>) -> Box<dyn Parser> {
        NpyParserProvider { expected_shape }.get_parser()
    }

    fn sample_image(rings: usize, azimuths: usize) -> RangeImage {
        let points: Vec<Point> = (0..rings * azimuths)
            .map(|n| Point {
                x: n as f64,
                y: -(n as f64),
                z: 0.5,
                intensity: 0.1,
                reflectivity: 0.2,
                label: (n % 5) as u32,
            })
            .collect();
        RangeImage::from_points(rings, azimuths, &points).unwrap()
    }

    #[test]
    fn round_trips_written_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npy");
        let image = sample_image(4, 3);

        write_npy(&path, &image).unwrap();
        let decoded = parser(Some((4, 3))).parse(&path).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn rejects_unexpected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npy");
        write_npy(&path, &sample_image(4, 3)).unwrap();

        let err = parser(Some((64, 512))).parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Grid(GridError::ShapeMismatch { .. })));
    }

    fn write_rank2_npy(path: &Path, rings: usize, azimuths: usize, values: &[f64]) {
        let dict = format!(
            "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
            rings, azimuths
        );
        let mut header = dict.into_bytes();
        let pad = (64 - (10 + header.len() + 1) % 64) % 64;
        header.extend(std::iter::repeat(b' ').take(pad));
        header.push(b'\n');

        let mut file = File::create(path).unwrap();
        file.write_all(NPY_MAGIC).unwrap();
        file.write_all(&[1, 0]).unwrap();
        file.write_u16::<LittleEndian>(header.len() as u16).unwrap();
        file.write_all(&header).unwrap();
        for value in values {
            file.write_f64::<LittleEndian>(*value).unwrap();
        }
    }

    #[test]
    fn rank2_arrays_decode_as_label_maps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pred.npy");
        write_rank2_npy(&path, 2, 2, &[0.0, 1.0, 2.0, 4.0]);

        let image = parser(Some((2, 2))).parse(&path).unwrap();
        assert_eq!(image.point(0, 0).label, 0);
        assert_eq!(image.point(0, 1).label, 1);
        assert_eq!(image.point(1, 0).label, 2);
        assert_eq!(image.point(1, 1).label, 4);
        assert_eq!(image.point(1, 1).x, 0.0);
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not.npy");
        std::fs::write(&path, b"PLAINTEXT").unwrap();

        let err = parser(None).parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::NpyHeader { .. }));
    }

    #[test]
    fn rejects_truncated_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.npy");
        write_npy(&path, &sample_image(2, 2)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let err = parser(None).parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
