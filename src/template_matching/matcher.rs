//! Template matching pipeline
//!
//! Escalates from the three-method comparison through multi-scale and preprocessed
//! matching to a relaxed-threshold retry, stopping at the first accepted result.
use super::config::MatchConfig;
use super::confidence::{effective_threshold, relaxed_threshold};
use super::correlate::{Correlation, rgb_planes};
use super::preprocess::Preprocessed;
use super::types::{Candidate, MatchMethod, MatchResult, MatchStrategy, Representation};
use crate::config::MatchingAlgorithm;
use crate::device::Frame;
use crate::templates::Template;
use image::{GrayImage, RgbImage, imageops::FilterType};

/// Stateless template matcher: identical inputs always give identical results.
pub struct TemplateMatcher {
    config: MatchConfig,
}

impl TemplateMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Effective threshold for `template` at the given base confidence
    pub fn threshold_for(&self, template: &Template, base_confidence: f32) -> f32 {
        effective_threshold(
            base_confidence,
            template.class,
            self.config.adaptive_confidence,
        )
    }

    /// Find `template` in `frame` at the template's own base confidence
    pub fn find(&self, frame: &Frame, template: &Template) -> Option<MatchResult> {
        self.find_with(frame, template, template.base_confidence)
    }

    /// Find `template` in `frame`, running the configured pipeline
    pub fn find_with(
        &self,
        frame: &Frame,
        template: &Template,
        base_confidence: f32,
    ) -> Option<MatchResult> {
        let threshold = self.threshold_for(template, base_confidence);
        let frame_planes = rgb_planes(&frame.image);
        let template_planes = rgb_planes(&template.image);

        let result = match self.config.algorithm {
            MatchingAlgorithm::Basic => Self::single_method(
                &frame_planes,
                &template_planes,
                MatchMethod::CorrelationCoefficient,
            )
            .and_then(|c| MatchResult::accept(c, threshold, MatchStrategy::Basic, 1.0)),
            MatchingAlgorithm::MultiMethod => {
                Self::multi_method(&frame_planes, &template_planes)
                    .and_then(|c| MatchResult::accept(c, threshold, MatchStrategy::MultiMethod, 1.0))
            }
            MatchingAlgorithm::Enhanced => {
                self.enhanced(frame, template, &frame_planes, &template_planes, threshold)
            }
        };

        match &result {
            Some(m) => log::info!("🎯 {}", m.describe(&template.name)),
            None => log::debug!(
                "👀 '{}' not found (threshold {:.3})",
                template.name,
                threshold
            ),
        }
        result
    }

    /// Best multi-method window regardless of threshold. None only when the template
    /// cannot fit in the frame.
    pub fn best_candidate(&self, frame: &Frame, template: &Template) -> Option<Candidate> {
        Self::multi_method(&rgb_planes(&frame.image), &rgb_planes(&template.image))
    }

    fn enhanced(
        &self,
        frame: &Frame,
        template: &Template,
        frame_planes: &[GrayImage],
        template_planes: &[GrayImage],
        threshold: f32,
    ) -> Option<MatchResult> {
        let multi = Self::multi_method(frame_planes, template_planes);
        if let Some(result) =
            multi.and_then(|c| MatchResult::accept(c, threshold, MatchStrategy::MultiMethod, 1.0))
        {
            return Some(result);
        }

        if self.config.enable_multiscale
            && let Some((candidate, scale)) = self.multi_scale(frame_planes, &template.image)
            && let Some(result) =
                MatchResult::accept(candidate, threshold, MatchStrategy::MultiScale, scale)
        {
            log::debug!("📐 '{}' matched at scale {:.2}", template.name, scale);
            return Some(result);
        }

        if self.config.enable_preprocessing
            && let Some((candidate, representation)) =
                Self::preprocessed(&frame.image, &template.image)
            && let Some(result) = MatchResult::accept(
                candidate,
                threshold,
                MatchStrategy::Preprocessed(representation),
                1.0,
            )
        {
            return Some(result);
        }

        if self.config.adaptive_confidence
            && let Some(lower) = relaxed_threshold(threshold)
        {
            log::debug!(
                "🔁 Retrying '{}' with relaxed threshold {:.3} -> {:.3}",
                template.name,
                threshold,
                lower
            );
            // The multi-method scores do not depend on the threshold, so the retry
            // re-judges the same best candidate.
            return multi.and_then(|c| MatchResult::accept(c, lower, MatchStrategy::Relaxed, 1.0));
        }

        None
    }

    /// Best window of one measure
    fn single_method(
        frame_planes: &[GrayImage],
        template_planes: &[GrayImage],
        method: MatchMethod,
    ) -> Option<Candidate> {
        Correlation::new(frame_planes, template_planes).map(|c| c.best(method))
    }

    /// Best window across all three measures; earlier methods win ties
    fn multi_method(frame_planes: &[GrayImage], template_planes: &[GrayImage]) -> Option<Candidate> {
        let correlation = Correlation::new(frame_planes, template_planes)?;
        let mut best: Option<Candidate> = None;
        for method in MatchMethod::ALL {
            let candidate = correlation.best(method);
            log::trace!("  {:?}: {:.3}", method, candidate.confidence);
            if best.is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Best correlation-coefficient window over the configured scales. Scales whose
    /// resized template is empty or larger than the frame are skipped.
    fn multi_scale(&self, frame_planes: &[GrayImage], template: &RgbImage) -> Option<(Candidate, f32)> {
        let (fw, fh) = frame_planes.first()?.dimensions();
        let mut best: Option<(Candidate, f32)> = None;

        for scale in self.config.scales() {
            let width = (template.width() as f32 * scale).round() as u32;
            let height = (template.height() as f32 * scale).round() as u32;
            if width == 0 || height == 0 || width > fw || height > fh {
                log::trace!("  scale {:.2} skipped ({}x{})", scale, width, height);
                continue;
            }

            let scaled = if width == template.width() && height == template.height() {
                template.clone()
            } else {
                image::imageops::resize(template, width, height, FilterType::Triangle)
            };
            let Some(candidate) = Self::single_method(
                frame_planes,
                &rgb_planes(&scaled),
                MatchMethod::CorrelationCoefficient,
            ) else {
                continue;
            };
            if best.is_none_or(|(b, _)| candidate.confidence > b.confidence) {
                best = Some((candidate, scale));
            }
        }
        best
    }

    /// Best correlation-coefficient window across the derived representations
    fn preprocessed(frame: &RgbImage, template: &RgbImage) -> Option<(Candidate, Representation)> {
        let frame_pre = Preprocessed::new(frame);
        let template_pre = Preprocessed::new(template);
        let mut best: Option<(Candidate, Representation)> = None;

        for representation in Representation::ALL {
            let Some(candidate) = Self::single_method(
                std::slice::from_ref(frame_pre.get(representation)),
                std::slice::from_ref(template_pre.get(representation)),
                MatchMethod::CorrelationCoefficient,
            ) else {
                continue;
            };
            if best.is_none_or(|(b, _)| candidate.confidence > b.confidence) {
                log::trace!("  {:?}: {:.3}", representation, candidate.confidence);
                best = Some((candidate, representation));
            }
        }
        best
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}
