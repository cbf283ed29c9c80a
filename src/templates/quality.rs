//! Reference image quality scoring
//!
//! Flags templates that are likely to produce weak or ambiguous matches: too small or
//! too large, washed out, featureless or flat.

use super::store::Template;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::{edges::canny, filter::laplacian_filter};
use serde::Serialize;

const MIN_SIDE: u32 = 20;
const MAX_SIDE: u32 = 200;
const MIN_CONTRAST: f64 = 20.0;
const MIN_EDGE_DENSITY: f64 = 0.1;
const MIN_TEXTURE_VARIANCE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum QualityLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityLevel {
    fn from_score(score: u32) -> Self {
        match score {
            75.. => QualityLevel::Excellent,
            50..=74 => QualityLevel::Good,
            25..=49 => QualityLevel::Fair,
            _ => QualityLevel::Poor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateQuality {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Standard deviation of the grayscale intensities
    pub contrast: f64,
    /// Fraction of pixels on a Canny edge
    pub edge_density: f64,
    /// Variance of the Laplacian response
    pub texture_variance: f64,
    /// Mean colour per channel
    pub mean_color: [f64; 3],
    /// 0, 25, 50, 75 or 100: 25 per passed check
    pub score: u32,
    pub level: QualityLevel,
    pub recommendations: Vec<String>,
}

impl TemplateQuality {
    /// Base confidence correction suggested by the score: poor templates get a lower
    /// bar, excellent ones a slightly higher one.
    pub fn suggested_confidence_adjustment(&self) -> f32 {
        if self.score < 50 {
            -0.1
        } else if self.score > 75 {
            0.05
        } else {
            0.0
        }
    }

    /// Small templates benefit from a wider scale search
    pub fn suggests_wider_scale_range(&self) -> bool {
        self.width < 30 || self.height < 30
    }
}

/// Score a loaded template
pub fn analyze(template: &Template) -> TemplateQuality {
    analyze_image(&template.name, &template.image)
}

pub fn analyze_image(name: &str, image: &RgbImage) -> TemplateQuality {
    let (width, height) = image.dimensions();
    let gray = image::imageops::grayscale(image);
    let mut recommendations = Vec::new();

    let size_ok = (MIN_SIDE..=MAX_SIDE).contains(&width) && (MIN_SIDE..=MAX_SIDE).contains(&height);
    if width < MIN_SIDE || height < MIN_SIDE {
        recommendations.push(format!(
            "Template is small ({}x{}); crop at least {}x{} pixels",
            width, height, MIN_SIDE, MIN_SIDE
        ));
    } else if width > MAX_SIDE || height > MAX_SIDE {
        recommendations.push(format!(
            "Template is large ({}x{}); matching will be slow",
            width, height
        ));
    }

    let contrast = std_dev(&gray);
    if contrast < MIN_CONTRAST {
        recommendations.push("Low contrast; pick a region with stronger light/dark differences".to_string());
    }

    let edge_density = edge_density(&gray);
    if edge_density < MIN_EDGE_DENSITY {
        recommendations.push("Few edges; include more of the element's outline".to_string());
    }

    let texture_variance = laplacian_variance(&gray);
    if texture_variance < MIN_TEXTURE_VARIANCE {
        recommendations.push("Little texture; the template may match unrelated areas".to_string());
    }

    let score = [
        contrast >= MIN_CONTRAST,
        edge_density >= MIN_EDGE_DENSITY,
        texture_variance >= MIN_TEXTURE_VARIANCE,
        size_ok,
    ]
    .iter()
    .filter(|passed| **passed)
    .count() as u32
        * 25;

    let quality = TemplateQuality {
        name: name.to_string(),
        width,
        height,
        contrast,
        edge_density,
        texture_variance,
        mean_color: mean_color(image),
        score,
        level: QualityLevel::from_score(score),
        recommendations,
    };
    log::debug!(
        "🔬 {}: score {} ({:?}) contrast {:.1} edges {:.3} texture {:.1}",
        quality.name,
        quality.score,
        quality.level,
        quality.contrast,
        quality.edge_density,
        quality.texture_variance
    );
    quality
}

fn std_dev(gray: &GrayImage) -> f64 {
    let n = (gray.width() * gray.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = gray.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let variance = gray
        .pixels()
        .map(|p| (p[0] as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}

fn edge_density(gray: &GrayImage) -> f64 {
    let n = (gray.width() * gray.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let edges = canny(gray, 50.0, 150.0);
    edges.pixels().filter(|p| p[0] > 0).count() as f64 / n
}

fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    let n = (response.width() * response.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = response.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    response
        .pixels()
        .map(|p| (p[0] as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}

fn mean_color(image: &RgbImage) -> [f64; 3] {
    let n = (image.width() * image.height()) as f64;
    if n == 0.0 {
        return [0.0; 3];
    }
    let sums = image.pixels().fold([0.0; 3], |mut acc, Rgb(c)| {
        for (a, v) in acc.iter_mut().zip(c) {
            *a += *v as f64;
        }
        acc
    });
    sums.map(|s| s / n)
}
