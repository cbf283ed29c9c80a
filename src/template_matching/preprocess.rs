//! Derived single-channel representations used by the preprocessing fallback

use super::types::Representation;
use image::{GrayImage, RgbImage};
use imageproc::{contrast::equalize_histogram, edges::canny, filter::gaussian_blur_f32};

/// Sigma equivalent to a 3x3 Gaussian kernel
const BLUR_SIGMA: f32 = 0.8;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// The four representations of one image. Each builds on the previous one:
/// grayscale, blurred grayscale, equalized blur, edges of the equalized blur.
pub struct Preprocessed {
    pub grayscale: GrayImage,
    pub blurred: GrayImage,
    pub equalized: GrayImage,
    pub edges: GrayImage,
}

impl Preprocessed {
    pub fn new(image: &RgbImage) -> Self {
        let grayscale = image::imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&grayscale, BLUR_SIGMA);
        let equalized = equalize_histogram(&blurred);
        let edges = canny(&equalized, CANNY_LOW, CANNY_HIGH);
        Self {
            grayscale,
            blurred,
            equalized,
            edges,
        }
    }

    pub fn get(&self, representation: Representation) -> &GrayImage {
        match representation {
            Representation::Grayscale => &self.grayscale,
            Representation::Blurred => &self.blurred,
            Representation::Equalized => &self.equalized,
            Representation::Edges => &self.edges,
        }
    }
}
