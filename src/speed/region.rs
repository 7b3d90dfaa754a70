use nalgebra::Vector2;

use crate::speed::{features::Feature, matching::Match};

/// Default share of the shorter image side used as radius of the central region.
pub const DEFAULT_RADIUS_RATIO: f64 = 0.25;

/// Width and height of an image in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
}

impl ImageShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn central_radius(&self, radius_ratio: f64) -> f64 {
        self.width.min(self.height) as f64 * radius_ratio
    }
}

impl From<(u32, u32)> for ImageShape {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Matched locations that survived the central region filter,
/// index aligned between the two frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondences {
    pub source: Vec<Vector2<f64>>,
    pub target: Vec<Vector2<f64>>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Keep only matches whose source keypoint lies strictly inside a disk around the image center.
///
/// Peripheral regions suffer most from oblique viewing and platform tilt. The disk has a
/// radius of `min(width, height) * radius_ratio`; the target keypoint is not inspected.
pub fn filter_central<D>(
    source: &[Feature<D>],
    target: &[Feature<D>],
    matches: &[Match],
    shape: ImageShape,
    radius_ratio: f64,
) -> Correspondences {
    let center = shape.center();
    let max_radius = shape.central_radius(radius_ratio);

    let (source, target) = matches
        .iter()
        .map(|m| {
            (
                source[m.query_index].keypoint.position.cast::<f64>(),
                target[m.train_index].keypoint.position.cast::<f64>(),
            )
        })
        .filter(|(from, _)| (from - center).norm() < max_radius)
        .unzip();

    Correspondences { source, target }
}
