use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::ReaderBuilder;

use ri_core::rangeimage::grid::RangeImage;
use ri_core::rangeimage::point::{Point, POINT_FIELDS};

use super::{Parser, ParserProvider};
use crate::error::ParseError;

pub struct TextParserProvider {
    pub rings: usize,
    pub azimuths: usize,
}

impl ParserProvider for TextParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(TextParser {
            rings: self.rings,
            azimuths: self.azimuths,
        })
    }
}

/// Whitespace-delimited text, one cell per line in row-major (ring, then
/// azimuth) order: `x y z i r l`, optionally followed by extra columns
/// (sequential index, color annotations) which are ignored.
pub struct TextParser {
    pub rings: usize,
    pub azimuths: usize,
}

impl Parser for TextParser {
    fn parse(&self, path: &Path) -> Result<RangeImage, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut reader = ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut points = Vec::with_capacity(self.rings * self.azimuths);
        for (index, record) in reader.records().enumerate() {
            let line = index + 1;
            let record = record.map_err(|e| ParseError::Record {
                path: path.display().to_string(),
                line,
                reason: e.to_string(),
            })?;
            points.push(parse_record(&record, path, line)?);
        }

        RangeImage::from_points(self.rings, self.azimuths, &points).map_err(ParseError::from)
    }
}

fn parse_record(
    record: &csv::StringRecord,
    path: &Path,
    line: usize,
) -> Result<Point, ParseError> {
    if record.len() < POINT_FIELDS {
        return Err(ParseError::Record {
            path: path.display().to_string(),
            line,
            reason: format!(
                "expected at least {} fields, got {}",
                POINT_FIELDS,
                record.len()
            ),
        });
    }

    let mut fields = [0.0; POINT_FIELDS];
    for (index, field) in fields.iter_mut().enumerate() {
        let raw = record.get(index).unwrap_or_default();
        *field = raw.trim().parse().map_err(|e| ParseError::Record {
            path: path.display().to_string(),
            line,
            reason: format!("field {} ('{}'): {}", index, raw, e),
        })?;
    }
    Ok(Point::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use ri_core::error::GridError;

    use super::*;

    fn write_temp(lines: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file
    }

    fn parser(rings: usize, azimuths: usize) -> Box<dyn Parser> {
        TextParserProvider { rings, azimuths }.get_parser()
    }

    #[test]
    fn decodes_row_major_with_trailing_index() {
        let file = write_temp(
            "1.0 2.0 3.0 0.5 0.25 2.0 0\n\
             4.0 5.0 6.0 0.5 0.25 3.0 1\n\
             7.0 8.0 9.0 0.5 0.25 4.0 2\n\
             10.0 11.0 12.0 0.5 0.25 1.0 3\n",
        );

        let image = parser(2, 2).parse(file.path()).unwrap();
        assert_eq!(image.point(0, 0).x, 1.0);
        assert_eq!(image.point(0, 1).label, 3);
        assert_eq!(image.point(1, 0).y, 8.0);
        assert_eq!(image.point(1, 1).z, 12.0);
    }

    #[test]
    fn line_count_mismatch_is_explicit() {
        let file = write_temp("1 2 3 4 5 6\n1 2 3 4 5 6\n1 2 3 4 5 6\n");
        let err = parser(2, 2).parse(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Grid(GridError::ShapeMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn short_record_is_rejected() {
        let file = write_temp("1 2 3\n");
        let err = parser(1, 1).parse(file.path()).unwrap_err();
        assert!(matches!(err, ParseError::Record { line: 1, .. }));
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let file = write_temp("1 2 three 4 5 6\n");
        let err = parser(1, 1).parse(file.path()).unwrap_err();
        assert!(matches!(err, ParseError::Record { line: 1, .. }));
    }
}
