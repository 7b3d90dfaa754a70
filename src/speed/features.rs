use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};
use nalgebra::Vector2;
use tracing::debug;

use crate::algorithms::brief::{self, BinaryDescriptor, HALF_PATCH};

/// Const Generic assignment of Feature Descriptor Size (256 bits)
pub const DESCRIPTOR_SIZE: usize = 256 / u8::BITS as usize;

pub type Descriptor = BinaryDescriptor<DESCRIPTOR_SIZE>;
pub type SizedFeature = Feature<Descriptor>;

/// Corners closer than this to the border are dropped, so the whole
/// sampling patch of their descriptor lies inside the image.
pub const EDGE_THRESHOLD: u32 = HALF_PATCH as u32 + 1;

/// Radius within which only the strongest FAST response survives.
const NMS_RADIUS: u32 = 3;

/// A detected salient location in image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Vector2<f32>,
    /// FAST corner response, higher is stronger
    pub score: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            score: 0.0,
        }
    }
}

/// Feature object which holds a keypoint on an image
/// together with the descriptor computed for it
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<Descriptor> {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// ORB-style detector: FAST-9 corners described with BRIEF on a blurred copy of the image.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    pub fast_threshold: u8,
    pub blur_sigma: f32,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            blur_sigma: 2.0,
        }
    }
}

impl FeatureExtractor {
    pub fn new(fast_threshold: u8, blur_sigma: f32) -> Self {
        Self {
            fast_threshold,
            blur_sigma,
        }
    }

    /// Detect at most `max_features` keypoints and describe each of them.
    ///
    /// The strongest corners win; equal scores are ordered by row, then column,
    /// so the selection only depends on the image content.
    pub fn extract(&self, image: &GrayImage, max_features: usize) -> Vec<SizedFeature> {
        let corners = self.fast_keypoints(image, max_features);
        if corners.is_empty() {
            return Vec::new();
        }

        // blur before sampling BRIEF pairs, single pixel noise
        // would otherwise flip descriptor bits between frames.
        let smoothed_image = imageproc::filter::gaussian_blur_f32(image, self.blur_sigma);

        let features: Vec<SizedFeature> = corners
            .into_iter()
            .map(|Corner { x, y, score, .. }| Feature {
                keypoint: Keypoint {
                    position: Vector2::new(x as f32, y as f32),
                    score,
                },
                descriptor: brief::compute_descriptor(x, y, &smoothed_image),
            })
            .collect();

        debug!(
            width = image.width(),
            height = image.height(),
            features = features.len(),
            "extracted features"
        );
        features
    }

    /// Uses FAST (Features from Accelerated Segment Test)
    /// as a keypoint detector for features like corners in a grayscale image
    fn fast_keypoints(&self, image: &GrayImage, max_features: usize) -> Vec<Corner> {
        let (width, height) = image.dimensions();
        if max_features == 0 || width <= 2 * EDGE_THRESHOLD || height <= 2 * EDGE_THRESHOLD {
            return Vec::new();
        }

        let corners: Vec<Corner> = corners_fast9(image, self.fast_threshold)
            .into_iter()
            .filter(|c| {
                c.x >= EDGE_THRESHOLD
                    && c.y >= EDGE_THRESHOLD
                    && c.x < width - EDGE_THRESHOLD
                    && c.y < height - EDGE_THRESHOLD
            })
            .collect();

        let mut corners = imageproc::suppress::local_maxima(&corners, NMS_RADIUS);
        corners.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
        });
        corners.truncate(max_features);
        corners
    }
}

/// Extract features with the default detector settings.
pub fn extract_features(image: &GrayImage, max_features: usize) -> Vec<SizedFeature> {
    FeatureExtractor::default().extract(image, max_features)
}
