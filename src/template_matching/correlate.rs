//! Correlation surfaces for template matching
//!
//! The raw per-channel cross-correlation comes from `imageproc`; window sums come from
//! summed-area tables so every normalized score is derived from the same three terms:
//! Σ I·T, Σ I and Σ I² over the window.

use super::types::{Candidate, MatchMethod};
use crate::device::Position;
use image::{GrayImage, RgbImage};
use imageproc::template_matching::{MatchTemplateMethod, match_template};

/// Windows whose (co)variance falls below this carry no structure and score 0.
const MIN_ENERGY: f64 = 0.25;

/// Split an RGB image into one grayscale plane per channel
pub fn rgb_planes(image: &RgbImage) -> Vec<GrayImage> {
    (0..3)
        .map(|c| {
            GrayImage::from_fn(image.width(), image.height(), |x, y| {
                image::Luma([image.get_pixel(x, y)[c]])
            })
        })
        .collect()
}

/// Summed-area tables of values and squared values for one plane
struct SummedArea {
    stride: usize,
    sums: Vec<f64>,
    squares: Vec<f64>,
}

impl SummedArea {
    fn new(plane: &GrayImage) -> Self {
        let (w, h) = (plane.width() as usize, plane.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0.0; stride * (h + 1)];
        let mut squares = vec![0.0; stride * (h + 1)];

        for y in 0..h {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = plane.get_pixel(x as u32, y as u32)[0] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + (x + 1);
                sums[idx] = sums[idx - stride] + row_sum;
                squares[idx] = squares[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            sums,
            squares,
        }
    }

    /// (Σ v, Σ v²) over the w×h window whose top-left corner is (x, y)
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let s = self.stride;
        let (a, b, c, d) = (
            y * s + x,
            y * s + x + w,
            (y + h) * s + x,
            (y + h) * s + x + w,
        );
        (
            self.sums[d] - self.sums[b] - self.sums[c] + self.sums[a],
            self.squares[d] - self.squares[b] - self.squares[c] + self.squares[a],
        )
    }
}

struct PlaneTerms {
    cross: image::ImageBuffer<image::Luma<f32>, Vec<f32>>,
    frame: SummedArea,
    template_sum: f64,
    template_sq: f64,
}

/// Precomputed correlation terms of one template against one frame.
///
/// Frames and templates are given as matching lists of planes (3 for colour, 1 for
/// grayscale); multi-channel scores sum the per-channel terms.
pub struct Correlation {
    planes: Vec<PlaneTerms>,
    out_width: u32,
    out_height: u32,
    template_width: u32,
    template_height: u32,
}

impl Correlation {
    /// Returns None when the template is empty, larger than the frame, or the plane
    /// counts disagree.
    pub fn new(frame: &[GrayImage], template: &[GrayImage]) -> Option<Self> {
        if frame.is_empty() || frame.len() != template.len() {
            return None;
        }
        let (fw, fh) = frame[0].dimensions();
        let (tw, th) = template[0].dimensions();
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let planes = frame
            .iter()
            .zip(template)
            .map(|(f, t)| {
                let (template_sum, template_sq) = t.pixels().fold((0.0, 0.0), |(s, q), p| {
                    let v = p[0] as f64;
                    (s + v, q + v * v)
                });
                PlaneTerms {
                    cross: match_template(f, t, MatchTemplateMethod::CrossCorrelation),
                    frame: SummedArea::new(f),
                    template_sum,
                    template_sq,
                }
            })
            .collect();

        Some(Self {
            planes,
            out_width: fw - tw + 1,
            out_height: fh - th + 1,
            template_width: tw,
            template_height: th,
        })
    }

    /// Similarity in [0, 1] of the window at (x, y) under `method`
    pub fn score(&self, method: MatchMethod, x: u32, y: u32) -> f32 {
        let n = (self.template_width * self.template_height) as f64;
        let (w, h) = (self.template_width as usize, self.template_height as usize);

        let mut cross = 0.0;
        let mut frame_sq = 0.0;
        let mut template_sq = 0.0;
        let mut centered_cross = 0.0;
        let mut frame_var = 0.0;
        let mut template_var = 0.0;

        for plane in &self.planes {
            let cc = plane.cross.get_pixel(x, y)[0] as f64;
            let (sum, sq) = plane.frame.window(x as usize, y as usize, w, h);
            cross += cc;
            frame_sq += sq;
            template_sq += plane.template_sq;
            centered_cross += cc - sum * plane.template_sum / n;
            frame_var += sq - sum * sum / n;
            template_var += plane.template_sq - plane.template_sum * plane.template_sum / n;
        }

        let value = match method {
            MatchMethod::CrossCorrelation => {
                let den = (frame_sq * template_sq).sqrt();
                if den < MIN_ENERGY { 0.0 } else { cross / den }
            }
            MatchMethod::CorrelationCoefficient => {
                if frame_var < MIN_ENERGY || template_var < MIN_ENERGY {
                    0.0
                } else {
                    centered_cross / (frame_var * template_var).sqrt()
                }
            }
            MatchMethod::SquaredDifference => {
                let den = (frame_sq * template_sq).sqrt();
                if den < MIN_ENERGY {
                    0.0
                } else {
                    1.0 - (frame_sq - 2.0 * cross + template_sq) / den
                }
            }
        };
        value.clamp(0.0, 1.0) as f32
    }

    /// Best window under `method`, scanning row-major; the first of equal scores wins.
    /// Position is the centre of the template footprint.
    pub fn best(&self, method: MatchMethod) -> Candidate {
        let mut best_score = f32::NEG_INFINITY;
        let mut best_xy = (0, 0);
        for y in 0..self.out_height {
            for x in 0..self.out_width {
                let s = self.score(method, x, y);
                if s > best_score {
                    best_score = s;
                    best_xy = (x, y);
                }
            }
        }
        Candidate {
            position: Position::new(
                (best_xy.0 + self.template_width / 2) as i32,
                (best_xy.1 + self.template_height / 2) as i32,
            ),
            confidence: best_score.max(0.0),
            method,
        }
    }
}
