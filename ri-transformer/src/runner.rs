use ri_core::rangeimage::grid::RangeImage;

use crate::transform::Transform;

pub trait Transformer {
    fn execute(&self, image: RangeImage) -> Vec<RangeImage>;
}

pub struct RangeImageTransformer {
    transform: Box<dyn Transform>,
}

impl RangeImageTransformer {
    pub fn new(transform: Box<dyn Transform>) -> Self {
        Self { transform }
    }
}

impl Transformer for RangeImageTransformer {
    fn execute(&self, image: RangeImage) -> Vec<RangeImage> {
        self.transform.transform(image)
    }
}
