use ri_core::rangeimage::grid::RangeImage;
use ri_core::rangeimage::point::POINT_FIELDS;

use super::Transform;

/// Rewrites every point labeled `merge_from` to `keep`; all other fields are
/// untouched.
pub struct LabelMerge {
    pub keep: u32,
    pub merge_from: u32,
}

impl Transform for LabelMerge {
    fn transform(&self, image: RangeImage) -> Vec<RangeImage> {
        let mut image = image;
        let merge_from = self.merge_from as f64;
        let keep = self.keep as f64;
        for cell in image.cells_mut() {
            if cell[POINT_FIELDS - 1] == merge_from {
                cell[POINT_FIELDS - 1] = keep;
            }
        }
        vec![image]
    }
}

#[cfg(test)]
mod tests {
    use ri_core::rangeimage::point::Point;

    use super::*;

    #[test]
    fn merges_one_class_into_another() {
        let points: Vec<Point> = [1, 2, 3, 4, 3, 2]
            .iter()
            .map(|&label| Point {
                x: label as f64 * 10.0,
                label,
                ..Point::default()
            })
            .collect();
        let image = RangeImage::from_points(2, 3, &points).unwrap();

        let output = LabelMerge {
            keep: 2,
            merge_from: 3,
        }
        .transform(image)
        .remove(0);

        let labels: Vec<u32> = output.points().map(|p| p.label).collect();
        assert_eq!(labels, vec![1, 2, 2, 4, 2, 2]);
        // the rest of the record is untouched
        let xs: Vec<f64> = output.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0, 40.0, 30.0, 20.0]);
    }

    #[test]
    fn other_labels_are_preserved() {
        let points = vec![
            Point {
                label: 0,
                ..Point::default()
            },
            Point {
                label: 4,
                ..Point::default()
            },
        ];
        let image = RangeImage::from_points(1, 2, &points).unwrap();

        let output = LabelMerge {
            keep: 2,
            merge_from: 3,
        }
        .transform(image)
        .remove(0);

        assert_eq!(output.point(0, 0).label, 0);
        assert_eq!(output.point(0, 1).label, 4);
    }
}
