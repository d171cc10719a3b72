mod draw;
mod layout;
mod markup;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use xcowsay_ipc::CowMode;

use crate::core::{trim_message, CowConfig, CowRequest};
use crate::platform::BubbleRenderer;

pub use draw::*;
pub use layout::wrap_text;
pub use markup::{display_text, strip_markup, MarkupError};

// Transparent margin around the whole bubble
const BUBBLE_BORDER: i32 = 5;
const TIP_WIDTH: i32 = 20;
const CORNER_RADIUS: i32 = 16;
const OUTLINE: i32 = 3;
const LINE_GAP: u32 = 4;
const MAX_DREAM_WIDTH: u32 = 640;
const MAX_DREAM_HEIGHT: u32 = 480;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// Rounded box with a pointed tip.
    Speech,
    /// Rounded box trailing thought circles.
    Thought,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleStyle {
    pub wrap_width: Option<usize>,
    pub font_scale: u32,
    /// The bubble sits to the left of the cow, so its tip is on the right.
    pub left: bool,
}

impl BubbleStyle {
    pub fn from_config(config: &CowConfig) -> Self {
        Self {
            wrap_width: config.bubble.wrap_width,
            font_scale: config.bubble.font_scale,
            left: config.placement.left,
        }
    }
}

/// Draws speech, thought and dream bubbles with the built-in bitmap font.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinRenderer;

impl BuiltinRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn text_bubble(&self, text: &str, kind: BubbleKind, style: &BubbleStyle) -> RgbaImage {
        let lines = wrap_text(&display_text(text), style.wrap_width);
        let scale = style.font_scale.max(1);
        let (text_w, text_h) = text_size(&lines, scale, LINE_GAP);

        let (mut img, inner_x, inner_y) = bubble_frame(text_w, text_h, kind, style.left);

        let line_h = (GLYPH_SIZE * scale + LINE_GAP) as i32;
        for (idx, line) in lines.iter().enumerate() {
            draw_bitmap_text(
                &mut img,
                inner_x,
                inner_y + idx as i32 * line_h,
                line,
                INK,
                scale,
            );
        }
        img
    }

    pub fn dream_bubble(&self, dream: &RgbaImage, style: &BubbleStyle) -> RgbaImage {
        let dream = fit_within(dream, MAX_DREAM_WIDTH, MAX_DREAM_HEIGHT);
        let (mut img, inner_x, inner_y) =
            bubble_frame(dream.width(), dream.height(), BubbleKind::Thought, style.left);
        image::imageops::overlay(&mut img, &dream, inner_x as i64, inner_y as i64);
        img
    }
}

impl BubbleRenderer for BuiltinRenderer {
    fn render(&self, request: &CowRequest, style: &BubbleStyle) -> Result<RgbaImage> {
        match request.mode {
            CowMode::Normal => Ok(self.text_bubble(
                trim_message(&request.content),
                BubbleKind::Speech,
                style,
            )),
            CowMode::Think => Ok(self.text_bubble(
                trim_message(&request.content),
                BubbleKind::Thought,
                style,
            )),
            CowMode::Dream => {
                let dream = image::open(&request.content)
                    .with_context(|| format!("Failed to load dream image {}", request.content))?
                    .to_rgba8();
                Ok(self.dream_bubble(&dream, style))
            }
        }
    }
}

fn fit_within(img: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w <= max_w && h <= max_h {
        return img.clone();
    }
    let ratio = f64::min(f64::from(max_w) / f64::from(w), f64::from(max_h) / f64::from(h));
    let new_w = ((f64::from(w) * ratio).round() as u32).max(1);
    let new_h = ((f64::from(h) * ratio).round() as u32).max(1);
    image::imageops::resize(img, new_w, new_h, FilterType::Triangle)
}

/// Draw an empty bubble sized for `content_w` x `content_h` of content.
/// Returns the image and the top-left corner of the content area.
fn bubble_frame(content_w: u32, content_h: u32, kind: BubbleKind, tip_right: bool) -> (RgbaImage, i32, i32) {
    let pad = CORNER_RADIUS;
    let body_w = content_w as i32 + 2 * pad;
    let body_h = content_h as i32 + 2 * pad;
    let width = body_w + TIP_WIDTH + 2 * BUBBLE_BORDER;
    let height = body_h + 2 * BUBBLE_BORDER;

    let mut img = RgbaImage::from_pixel(width as u32, height as u32, CLEAR);

    let body_x0 = if tip_right {
        BUBBLE_BORDER
    } else {
        BUBBLE_BORDER + TIP_WIDTH
    };
    let body_y0 = BUBBLE_BORDER;
    let body_x1 = body_x0 + body_w;
    let body_y1 = body_y0 + body_h;

    fill_rounded_rect(&mut img, body_x0, body_y0, body_x1, body_y1, CORNER_RADIUS, INK);
    fill_rounded_rect(
        &mut img,
        body_x0 + OUTLINE,
        body_y0 + OUTLINE,
        body_x1 - OUTLINE,
        body_y1 - OUTLINE,
        CORNER_RADIUS - OUTLINE,
        PAPER,
    );

    // Edge of the body facing the cow, and the direction towards it
    let (edge, dir) = if tip_right {
        (f64::from(body_x1), 1.0)
    } else {
        (f64::from(body_x0), -1.0)
    };
    let mid = f64::from(body_y0 + body_y1) / 2.0;

    match kind {
        BubbleKind::Speech => {
            let half = (f64::from(body_h) / 6.0).clamp(6.0, 20.0);
            let point = (edge + dir * f64::from(TIP_WIDTH), mid);
            fill_triangle(
                &mut img,
                (edge - dir * f64::from(OUTLINE), mid - half),
                (edge - dir * f64::from(OUTLINE), mid + half),
                point,
                INK,
            );
            let inset = f64::from(OUTLINE) * 2.0;
            fill_triangle(
                &mut img,
                (edge - dir * f64::from(OUTLINE), mid - half + inset),
                (edge - dir * f64::from(OUTLINE), mid + half - inset),
                (point.0 - dir * inset, mid),
                PAPER,
            );
        }
        BubbleKind::Thought => {
            let circles = [(0.2, 7.0), (0.55, 5.0), (0.85, 3.5)];
            for (along, radius) in circles {
                let cx = edge + dir * f64::from(TIP_WIDTH) * along;
                let cy = mid + f64::from(body_h) / 4.0 * along;
                draw_disc(&mut img, cx, cy, radius, INK);
                draw_disc(&mut img, cx, cy, radius - f64::from(OUTLINE) / 2.0, PAPER);
            }
        }
    }

    (img, body_x0 + pad, body_y0 + pad)
}
