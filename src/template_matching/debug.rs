//! Match visualization for diagnosing bad matches

use super::types::MatchResult;
use crate::device::Frame;
use crate::templates::Template;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Copy of the frame with the matched footprint outlined and its centre marked
pub fn render_match(frame: &Frame, template: &Template, result: &MatchResult) -> RgbImage {
    let mut output = frame.image.clone();

    let width = ((template.width() as f32 * result.scale).round() as u32).max(1);
    let height = ((template.height() as f32 * result.scale).round() as u32).max(1);
    let left = result.position.x - (width / 2) as i32;
    let top = result.position.y - (height / 2) as i32;

    draw_hollow_rect_mut(
        &mut output,
        Rect::at(left, top).of_size(width, height),
        BOX_COLOR,
    );
    draw_hollow_circle_mut(
        &mut output,
        (result.position.x, result.position.y),
        5,
        CENTER_COLOR,
    );
    draw_cross_mut(
        &mut output,
        CENTER_COLOR,
        result.position.x,
        result.position.y,
    );
    output
}

/// Render the match and save it as `debug_<template>.png` in `dir`
pub fn save_debug_match(
    frame: &Frame,
    template: &Template,
    result: &MatchResult,
    dir: &Path,
) -> image::ImageResult<PathBuf> {
    let path = dir.join(format!("debug_{}.png", template.name));
    render_match(frame, template, result).save(&path)?;
    log::info!("🖍️ Saved match visualization to {:?}", path);
    Ok(path)
}
