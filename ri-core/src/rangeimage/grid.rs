use crate::error::GridError;

use super::point::{Point, POINT_FIELDS};

/// Dense range image of shape (rings, azimuths, 6), row-major.
///
/// Axis 0 is the sensor ring (zenith level), axis 1 the azimuth bucket.
/// Every cell holds exactly one point record; a beam with no return is the
/// all-zero sentinel. Shape is fixed at construction and validated eagerly.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeImage {
    rings: usize,
    azimuths: usize,
    data: Vec<f64>,
}

impl RangeImage {
    pub fn zeros(rings: usize, azimuths: usize) -> Self {
        RangeImage {
            rings,
            azimuths,
            data: vec![0.0; rings * azimuths * POINT_FIELDS],
        }
    }

    /// Wraps a flat field buffer laid out as (ring, azimuth, field).
    pub fn from_raw(rings: usize, azimuths: usize, data: Vec<f64>) -> Result<Self, GridError> {
        let expected = rings * azimuths * POINT_FIELDS;
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                rings,
                azimuths,
                expected: rings * azimuths,
                actual: data.len() / POINT_FIELDS,
            });
        }
        Ok(RangeImage {
            rings,
            azimuths,
            data,
        })
    }

    /// Places a flat point sequence onto the grid in row-major order: the
    /// first `azimuths` points become ring 0, the next `azimuths` ring 1, ...
    pub fn from_points(rings: usize, azimuths: usize, points: &[Point]) -> Result<Self, GridError> {
        let expected = rings * azimuths;
        if points.len() != expected {
            return Err(GridError::ShapeMismatch {
                rings,
                azimuths,
                expected,
                actual: points.len(),
            });
        }
        let mut data = Vec::with_capacity(expected * POINT_FIELDS);
        for point in points {
            data.extend_from_slice(&point.to_fields());
        }
        Ok(RangeImage {
            rings,
            azimuths,
            data,
        })
    }

    pub fn rings(&self) -> usize {
        self.rings
    }

    pub fn azimuths(&self) -> usize {
        self.azimuths
    }

    pub fn point_count(&self) -> usize {
        self.rings * self.azimuths
    }

    fn cell_offset(&self, ring: usize, azimuth: usize) -> usize {
        (ring * self.azimuths + azimuth) * POINT_FIELDS
    }

    pub fn cell(&self, ring: usize, azimuth: usize) -> &[f64] {
        let offset = self.cell_offset(ring, azimuth);
        &self.data[offset..offset + POINT_FIELDS]
    }

    pub fn point(&self, ring: usize, azimuth: usize) -> Point {
        let cell = self.cell(ring, azimuth);
        let mut fields = [0.0; POINT_FIELDS];
        fields.copy_from_slice(cell);
        Point::from_fields(fields)
    }

    pub fn set_point(&mut self, ring: usize, azimuth: usize, point: &Point) {
        let offset = self.cell_offset(ring, azimuth);
        self.data[offset..offset + POINT_FIELDS].copy_from_slice(&point.to_fields());
    }

    /// All fields of one ring, azimuth-major.
    pub fn ring_row(&self, ring: usize) -> &[f64] {
        let row = self.azimuths * POINT_FIELDS;
        &self.data[ring * row..(ring + 1) * row]
    }

    /// Builds a new image from the given source rings, in the given order.
    pub fn select_rings(&self, indices: &[usize]) -> Result<RangeImage, GridError> {
        let mut data = Vec::with_capacity(indices.len() * self.azimuths * POINT_FIELDS);
        for &ring in indices {
            if ring >= self.rings {
                return Err(GridError::RingOutOfRange {
                    ring,
                    rings: self.rings,
                });
            }
            data.extend_from_slice(self.ring_row(ring));
        }
        Ok(RangeImage {
            rings: indices.len(),
            azimuths: self.azimuths,
            data,
        })
    }

    /// Cells in row-major (ring, then azimuth) order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.data.chunks_exact(POINT_FIELDS).map(|cell| {
            let mut fields = [0.0; POINT_FIELDS];
            fields.copy_from_slice(cell);
            Point::from_fields(fields)
        })
    }

    /// Mutable cell views in row-major order, POINT_FIELDS wide each.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.data.chunks_exact_mut(POINT_FIELDS)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_point(value: f64) -> Point {
        Point {
            x: value,
            ..Point::default()
        }
    }

    #[test]
    fn from_points_row_major_placement() {
        let points: Vec<Point> = (0..6).map(|n| marker_point(n as f64)).collect();
        let image = RangeImage::from_points(2, 3, &points).unwrap();

        assert_eq!(image.rings(), 2);
        assert_eq!(image.azimuths(), 3);
        assert_eq!(image.point(0, 0).x, 0.0);
        assert_eq!(image.point(0, 2).x, 2.0);
        assert_eq!(image.point(1, 0).x, 3.0);
        assert_eq!(image.point(1, 2).x, 5.0);

        let flat: Vec<f64> = image.points().map(|p| p.x).collect();
        assert_eq!(flat, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn from_points_rejects_wrong_count() {
        let points = vec![Point::default(); 5];
        let err = RangeImage::from_points(2, 3, &points).unwrap_err();
        assert!(matches!(
            err,
            GridError::ShapeMismatch {
                expected: 6,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn select_rings_preserves_order() {
        let points: Vec<Point> = (0..12).map(|n| marker_point(n as f64)).collect();
        let image = RangeImage::from_points(4, 3, &points).unwrap();

        let picked = image.select_rings(&[2, 0]).unwrap();
        assert_eq!(picked.rings(), 2);
        assert_eq!(picked.point(0, 0).x, 6.0);
        assert_eq!(picked.point(1, 0).x, 0.0);
    }

    #[test]
    fn select_rings_rejects_out_of_range() {
        let image = RangeImage::zeros(4, 3);
        let err = image.select_rings(&[4]).unwrap_err();
        assert!(matches!(err, GridError::RingOutOfRange { ring: 4, rings: 4 }));
    }

    #[test]
    fn cells_mut_exposes_label_channel() {
        let mut image = RangeImage::zeros(1, 2);
        for cell in image.cells_mut() {
            cell[5] = 3.0;
        }
        assert_eq!(image.point(0, 0).label, 3);
        assert_eq!(image.point(0, 1).label, 3);
    }
}
