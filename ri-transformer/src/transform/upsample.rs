use ri_core::rangeimage::grid::RangeImage;
use ri_core::rangeimage::point::Point;

use super::{RingVariant, Transform};

pub const UPSAMPLE_VARIANT: RingVariant = RingVariant {
    dir: "vlp32i",
    prefix: "z32i_",
};

/// Interpolation fraction between adjacent rings (midpoint).
const MIDPOINT: f64 = 0.5;

/// Doubles the ring count of an image by synthesizing one ring between each
/// pair of adjacent input rings. Input ring `i` lands at output ring `2i`;
/// the synthesized ring at `2i + 1` (the last one is interpolated against an
/// all-zero ring, there being no ring past the end).
///
/// Zero field values mean "no return" and are excluded from the arithmetic:
/// the means fall back to the present endpoint, while the y/z displacement
/// needs both endpoints and otherwise stays zero. A degenerate pair whose
/// planar distance is zero or non-finite yields a no-return cell rather than
/// a NaN.
pub struct RingUpsample;

impl Transform for RingUpsample {
    fn transform(&self, image: RangeImage) -> Vec<RangeImage> {
        let rings = image.rings();
        let azimuths = image.azimuths();
        let blank = Point::default();

        let mut output = RangeImage::zeros(rings * 2, azimuths);
        for ring in 0..rings {
            for azimuth in 0..azimuths {
                let lower = image.point(ring, azimuth);
                let upper = if ring + 1 < rings {
                    image.point(ring + 1, azimuth)
                } else {
                    blank.clone()
                };
                output.set_point(2 * ring + 1, azimuth, &interpolate(&lower, &upper));
                output.set_point(2 * ring, azimuth, &lower);
            }
        }
        vec![output]
    }
}

/// Zero is the no-return marker, not a measurement.
fn masked(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// Mean that ignores missing endpoints; both missing stays missing (zero).
fn masked_mean(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => (a + b) / 2.0,
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => 0.0,
    }
}

fn interpolate(lower: &Point, upper: &Point) -> Point {
    let mut point = Point {
        x: masked_mean(masked(lower.x), masked(upper.x)),
        y: 0.0,
        z: 0.0,
        intensity: masked_mean(masked(lower.intensity), masked(upper.intensity)),
        reflectivity: masked_mean(masked(lower.reflectivity), masked(upper.reflectivity)),
        // the numerically larger class id wins a label conflict
        label: lower.label.max(upper.label),
    };

    if let (Some(y1), Some(z1), Some(y2), Some(z2)) = (
        masked(lower.y),
        masked(lower.z),
        masked(upper.y),
        masked(upper.z),
    ) {
        let planar = ((z2 - z1).powi(2) + (y2 - y1).powi(2)).sqrt();
        if !planar.is_finite() || planar == 0.0 {
            // coincident rings leave no direction to step along
            return Point::default();
        }
        point.y = y1 + MIDPOINT * (y2 - y1) / planar;
        point.z = z1 + MIDPOINT * (z2 - z1) / planar;
    }
    point
}
