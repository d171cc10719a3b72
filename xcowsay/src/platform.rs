use anyhow::Result;
use image::RgbaImage;

use crate::core::{CowRequest, Monitor};
use crate::render::BubbleStyle;

pub type ShapeId = u64;

/// An on-screen image with no decorations. Shapes start out hidden.
pub trait Shape {
    fn id(&self) -> ShapeId;
    fn move_to(&mut self, x: i32, y: i32);
    fn show(&mut self);
    fn hide(&mut self);
    /// Release the shape. It cannot be used afterwards.
    fn destroy(self);
}

/// The screen the cow is drawn on.
pub trait Desktop {
    type Shape: Shape;

    fn monitors(&self) -> Vec<Monitor>;
    fn create_shape(&mut self, image: RgbaImage) -> Result<Self::Shape>;
}

/// Turns a request into the bubble image shown next to the cow.
pub trait BubbleRenderer {
    fn render(&self, request: &CowRequest, style: &BubbleStyle) -> Result<RgbaImage>;
}
