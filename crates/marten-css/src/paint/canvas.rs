//! The raster seam.
//!
//! Paint commands draw through [`Canvas`]. The browser crate implements it
//! on a pixel buffer; tests implement it with a recorder.

use crate::layout::{FontKey, Rect};
use crate::style::{BlendMode, ColorValue};

/// A drawing surface with a save/restore state stack.
///
/// `restore` undoes the most recent `save` or `save_layer`. Restoring a
/// layer composites it onto whatever is below using the opacity and blend
/// mode it was saved with.
pub trait Canvas {
    /// Fill `rect` with `color`.
    fn fill_rect(&mut self, rect: Rect, color: ColorValue);

    /// Fill `rect` with corners rounded to `radius`.
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: ColorValue);

    /// Stroke a straight line.
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: ColorValue);

    /// Draw `text` with its left edge at `x` and its baseline at `baseline`.
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, font: &FontKey, color: ColorValue);

    /// Push the current transform and clip.
    fn save(&mut self);

    /// Start an offscreen layer.
    fn save_layer(&mut self, opacity: f32, blend: BlendMode);

    /// Pop the most recent `save` or `save_layer`.
    fn restore(&mut self);

    /// Intersect the clip with a rounded rectangle.
    fn clip_rounded_rect(&mut self, rect: Rect, radius: f32);

    /// Move the origin.
    fn translate(&mut self, dx: f32, dy: f32);
}
