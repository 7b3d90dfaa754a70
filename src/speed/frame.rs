use image::GrayImage;

use crate::speed::{
    features::{FeatureExtractor, SizedFeature},
    region::ImageShape,
};

/// Features of one captured image. The pixels are not retained.
#[derive(Debug, Clone)]
pub struct Frame<Feat> {
    pub features: Vec<Feat>,
    pub shape: ImageShape,
}

impl Frame<SizedFeature> {
    pub fn from_image(image: &GrayImage, extractor: &FeatureExtractor, max_features: usize) -> Self {
        Self {
            features: extractor.extract(image, max_features),
            shape: ImageShape::new(image.width(), image.height()),
        }
    }
}
