use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::iproduct;

use ri_core::rangeimage::grid::RangeImage;

use crate::error::WriteError;

/// RGB color per class id, indexed by label.
pub type ClassColor = [u8; 3];

/// Annotation palette: unknown, car, pedestrian, cyclist, ground.
pub const DEFAULT_CLASS_COLORS: [ClassColor; 5] = [
    [125, 125, 125],
    [220, 0, 220],
    [0, 255, 0],
    [0, 0, 255],
    [255, 0, 0],
];

/// Encodes a range image as flat text, one cell per line in row-major (ring,
/// then azimuth) order: the six fields space-separated plus a zero-based
/// sequential index counted across the whole grid. The file is truncated,
/// never appended to.
pub fn write_text(path: &Path, image: &RangeImage) -> Result<(), WriteError> {
    let mut writer = create(path)?;

    for (num, (ring, azimuth)) in
        iproduct!(0..image.rings(), 0..image.azimuths()).enumerate()
    {
        let cell = image.cell(ring, azimuth);
        writeln!(
            writer,
            "{} {} {} {} {} {} {}",
            cell[0], cell[1], cell[2], cell[3], cell[4], cell[5], num
        )
        .map_err(|source| write_error(path, source))?;
    }

    writer.flush().map_err(|source| write_error(path, source))
}

/// Encodes a prediction grid as annotated text: the six fields followed by
/// the RGB color of the cell's class. A label outside the palette is an
/// error, not a panic.
pub fn write_colored_text(
    path: &Path,
    image: &RangeImage,
    palette: &[ClassColor],
) -> Result<(), WriteError> {
    let mut writer = create(path)?;

    for (ring, azimuth) in iproduct!(0..image.rings(), 0..image.azimuths()) {
        let cell = image.cell(ring, azimuth);
        let label = cell[5] as u32;
        let color = palette
            .get(label as usize)
            .ok_or(WriteError::UnknownClass {
                label,
                classes: palette.len(),
            })?;
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {} {}",
            cell[0], cell[1], cell[2], cell[3], cell[4], cell[5], color[0], color[1], color[2]
        )
        .map_err(|source| write_error(path, source))?;
    }

    writer.flush().map_err(|source| write_error(path, source))
}

fn create(path: &Path) -> Result<BufWriter<File>, WriteError> {
    let file = File::create(path).map_err(|source| WriteError::CreateFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn write_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::WriteFile {
        path: path.display().to_string(),
        source,
    }
}
