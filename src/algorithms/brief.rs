use bitarray::BitArray;
use image::GrayImage;
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Fixed-length binary descriptor, `N` bytes wide.
pub type BinaryDescriptor<const N: usize> = [u8; N];

/// Side length of the square patch the sampling pattern is drawn from.
pub const PATCH_SIZE: i16 = 31;

/// Largest offset a sample may take from the keypoint in either axis.
pub const HALF_PATCH: i16 = PATCH_SIZE / 2;

/// Number of point-pair tests available in the sampling pattern.
const MAX_BITS: usize = 512;

/// Compute BRIEF (Binary Robust Independent Elementary Features) on a given grayscale image given the target keypoint.
///
/// Each bit compares the intensities of one sampled point pair around `(x, y)`.
/// Samples falling outside of the image read as `0`.
///
/// ### CAUTION
/// const N Generic should be at most `512 / u8::BITS = 64`
pub fn compute_descriptor<const N: usize>(x: u32, y: u32, image: &GrayImage) -> BinaryDescriptor<N> {
    const BITS: usize = u8::BITS as _;
    debug_assert!(N * BITS <= MAX_BITS);

    let sample = |dx: i16, dy: i16| -> u8 {
        let (sx, sy) = (x as i64 + dx as i64, y as i64 + dy as i64);
        if sx >= 0 && sy >= 0 && (sx as u32) < image.width() && (sy as u32) < image.height() {
            image.get_pixel(sx as u32, sy as u32).0[0]
        } else {
            0
        }
    };

    let mut brief_descriptor = [0; N];
    for (i, byte) in brief_descriptor.iter_mut().enumerate() {
        for j in 0..BITS {
            let [p1x, p1y, p2x, p2y] = BRIEF_SAMPLES[i * BITS + j];
            *byte <<= 1;
            if sample(p1x, p1y) < sample(p2x, p2y) {
                *byte |= 1;
            }
        }
    }

    brief_descriptor
}

/// Number of differing bits between two descriptors.
pub fn hamming_distance<const N: usize>(a: &BinaryDescriptor<N>, b: &BinaryDescriptor<N>) -> u32 {
    BitArray::new(*a).distance(&BitArray::new(*b))
}

/// Precomputed point-pair samples for BRIEF tests.
/// The values remain consistent across frames and runs, because descriptors
/// of the same ground patch in two frames have to be comparable bit for bit.
static BRIEF_SAMPLES: Lazy<[[i16; 4]; MAX_BITS]> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(42);

    // isotropic gaussian with variance S^2 / 25, the best performing
    // arrangement in the BRIEF paper (Calonder et al., ECCV 2010)
    let normal_dist: Normal<f64> =
        Normal::new(0.0, PATCH_SIZE as f64 / 5.0).expect("standard deviation is positive");

    let mut draw = || (normal_dist.sample(&mut rng).round() as i16).clamp(-HALF_PATCH, HALF_PATCH);

    let mut samples = [[0; 4]; MAX_BITS];
    for sample in samples.iter_mut() {
        *sample = [draw(), draw(), draw(), draw()];
    }

    samples
});

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn textured(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 37 + y * 91) % 251) as u8]))
    }

    #[test]
    fn samples_stay_inside_patch() {
        for sample in BRIEF_SAMPLES.iter() {
            assert!(sample.iter().all(|v| v.abs() <= HALF_PATCH));
        }
    }

    #[test]
    fn descriptor_is_deterministic() {
        let image = textured(64, 64);
        let a: BinaryDescriptor<32> = compute_descriptor(32, 32, &image);
        let b: BinaryDescriptor<32> = compute_descriptor(32, 32, &image);
        assert_eq!(a, b);
    }

    #[test]
    fn flat_image_yields_zero_descriptor() {
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        let descriptor: BinaryDescriptor<32> = compute_descriptor(32, 32, &image);
        assert_eq!(descriptor, [0; 32]);
    }

    #[test]
    fn hamming_counts_differing_bits() {
        let a = [0b1010_1010u8; 4];
        let b = [0b0000_1010u8; 4];
        assert_eq!(hamming_distance(&a, &b), 8);
        assert_eq!(hamming_distance(&a, &a), 0);
    }
}
