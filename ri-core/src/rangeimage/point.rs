/// Number of scalar fields per point, in fixed array order [x, y, z, i, r, l].
pub const POINT_FIELDS: usize = 6;

/// One LiDAR return: position, intensity, a secondary reflectivity-like
/// scalar, and an integer class label. A cell where the sensor recorded
/// nothing carries the all-zero sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: f64,
    pub reflectivity: f64,
    pub label: u32,
}

impl Point {
    pub fn from_fields(fields: [f64; POINT_FIELDS]) -> Self {
        Point {
            x: fields[0],
            y: fields[1],
            z: fields[2],
            intensity: fields[3],
            reflectivity: fields[4],
            label: fields[5] as u32,
        }
    }

    pub fn to_fields(&self) -> [f64; POINT_FIELDS] {
        [
            self.x,
            self.y,
            self.z,
            self.intensity,
            self.reflectivity,
            self.label as f64,
        ]
    }

    /// True for the "no return" sentinel.
    pub fn is_no_return(&self) -> bool {
        self.to_fields().iter().all(|v| *v == 0.0)
    }
}
