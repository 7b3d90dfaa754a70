//! File system side of a run: reading a captured image sequence
//! and persisting the final speed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::GrayImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    error::{Result, SpeedError},
    speed::estimator::SpeedEstimate,
};

/// Naming scheme of a numbered capture sequence: `<directory>/<stem>-NN.<extension>`,
/// numbered from 1 with two digit zero padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLayout {
    pub directory: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl SequenceLayout {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            stem: "sequence".into(),
            extension: "jpg".into(),
        }
    }

    pub fn path(&self, number: usize) -> PathBuf {
        self.directory
            .join(format!("{}-{:02}.{}", self.stem, number, self.extension))
    }

    /// Paths of the first `frames` captures, in capture order.
    pub fn paths(&self, frames: usize) -> Vec<PathBuf> {
        (1..=frames).map(|number| self.path(number)).collect()
    }
}

/// Decode an image file into 8 bit grayscale.
pub fn load_image(path: impl AsRef<Path>) -> Result<GrayImage> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| SpeedError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma8();
    debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
    Ok(image)
}

/// Decode all images, keeping the given order. Fails on the first unreadable file.
pub fn load_sequence<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<GrayImage>> {
    let images = paths.par_iter().map(|path| load_image(path)).collect::<Result<Vec<_>>>()?;
    info!(frames = images.len(), "loaded image sequence");
    Ok(images)
}

/// Write the speed as a fixed point decimal with 4 fractional digits.
pub fn write_result(path: impl AsRef<Path>, estimate: &SpeedEstimate) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, estimate.formatted()).map_err(|source| SpeedError::ResultWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), speed = %estimate.formatted(), "wrote result");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_paths_are_one_based_and_padded() {
        let layout = SequenceLayout::new("/captures");
        assert_eq!(
            layout.paths(3),
            vec![
                PathBuf::from("/captures/sequence-01.jpg"),
                PathBuf::from("/captures/sequence-02.jpg"),
                PathBuf::from("/captures/sequence-03.jpg"),
            ]
        );
        assert_eq!(layout.path(42), PathBuf::from("/captures/sequence-42.jpg"));
    }

    #[test]
    fn missing_image_is_reported_with_its_path() {
        let err = load_image("/does/not/exist.png").unwrap_err();
        match err {
            SpeedError::ImageRead { path, .. } => assert_eq!(path, PathBuf::from("/does/not/exist.png")),
            other => panic!("unexpected error {other}"),
        }
    }
}
