use ri_core::rangeimage::grid::RangeImage;

use super::{RingVariant, Transform};

/// Output order of [`RingDownsample`]: the 32-ring image, then the three
/// offset 16-ring windows (down, mid, up).
pub const DOWNSAMPLE_VARIANTS: [RingVariant; 4] = [
    RingVariant {
        dir: "vlp32",
        prefix: "z32_",
    },
    RingVariant {
        dir: "vlp16d",
        prefix: "z16d_",
    },
    RingVariant {
        dir: "vlp16m",
        prefix: "z16m_",
    },
    RingVariant {
        dir: "vlp16u",
        prefix: "z16u_",
    },
];

/// Extracts lower-beam-count views from a 64-ring image: the even rings form
/// the 32-ring view, and every ring `z` with `z mod 4 == 1` contributes the
/// window (`z-1`, `z`, `z+1`) to the down/mid/up 16-ring views.
pub struct RingDownsample;

impl Transform for RingDownsample {
    fn transform(&self, image: RangeImage) -> Vec<RangeImage> {
        let rings = image.rings();
        let mut half = Vec::with_capacity(rings / 2);
        let mut down = Vec::with_capacity(rings / 4);
        let mut mid = Vec::with_capacity(rings / 4);
        let mut up = Vec::with_capacity(rings / 4);

        for z in 0..rings {
            if z % 2 == 0 {
                half.push(z);
            }
            // z + 1 must stay in range for ring counts other than 64
            if z % 4 == 1 && z + 1 < rings {
                down.push(z - 1);
                mid.push(z);
                up.push(z + 1);
            }
        }

        [half, down, mid, up]
            .iter()
            .map(|indices| {
                image
                    .select_rings(indices)
                    .expect("ring indices stay in range")
            })
            .collect()
    }
}
