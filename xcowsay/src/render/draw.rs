use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

pub const GLYPH_SIZE: u32 = 8;

fn clamp_i32(value: i32, min_value: i32, max_value: i32) -> i32 {
    value.max(min_value).min(max_value)
}

/// Source-over compositing of `src` onto `dst`.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| {
        (f64::from(d) * inv + f64::from(s) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let out_a = (f64::from(dst[3]) * inv + f64::from(src[3]))
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

fn plot(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i32 && y < img.height() as i32 {
        let dst = *img.get_pixel(x as u32, y as u32);
        img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
    }
}

pub fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    if radius <= 0.1 {
        plot(img, cx.round() as i32, cy.round() as i32, color);
        return;
    }
    let min_x = clamp_i32((cx - radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + radius).ceil() as i32, 0, img.height() as i32 - 1);
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                plot(img, x, y, color);
            }
        }
    }
}

/// Fill the half-open rectangle `[x0, x1) x [y0, y1)`.
pub fn fill_rect(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(img.width() as i32);
    let y1 = y1.min(img.height() as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            plot(img, x, y, color);
        }
    }
}

/// Fill a rectangle with quarter-circle corners of `radius`.
pub fn fill_rounded_rect(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: i32,
    color: Rgba<u8>,
) {
    let radius = radius.min((x1 - x0) / 2).min((y1 - y0) / 2).max(0);
    if radius == 0 {
        fill_rect(img, x0, y0, x1, y1, color);
        return;
    }

    let r = f64::from(radius);
    let r2 = r * r;
    let (cl, cr) = (f64::from(x0 + radius), f64::from(x1 - radius));
    let (ct, cb) = (f64::from(y0 + radius), f64::from(y1 - radius));
    for y in y0.max(0)..y1.min(img.height() as i32) {
        for x in x0.max(0)..x1.min(img.width() as i32) {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            let dx = if px < cl {
                cl - px
            } else if px > cr {
                px - cr
            } else {
                0.0
            };
            let dy = if py < ct {
                ct - py
            } else if py > cb {
                py - cb
            } else {
                0.0
            };
            if dx * dx + dy * dy <= r2 {
                plot(img, x, y, color);
            }
        }
    }
}

fn triangle_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    ((a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1)).abs()) / 2.0
}

fn point_in_triangle(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64), eps: f64) -> bool {
    let total = triangle_area(a, b, c);
    if total <= eps {
        return false;
    }
    let a1 = triangle_area(p, b, c);
    let a2 = triangle_area(a, p, c);
    let a3 = triangle_area(a, b, p);
    (a1 + a2 + a3 - total).abs() <= eps
}

pub fn fill_triangle(
    img: &mut RgbaImage,
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    color: Rgba<u8>,
) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    let min_x = clamp_i32(a.0.min(b.0).min(c.0).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32(a.0.max(b.0).max(c.0).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32(a.1.min(b.1).min(c.1).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32(a.1.max(b.1).max(c.1).ceil() as i32, 0, img.height() as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (f64::from(x) + 0.5, f64::from(y) + 0.5);
            if point_in_triangle(p, a, b, c, 0.8) {
                plot(img, x, y, color);
            }
        }
    }
}

/// Draw one line of text with the 8x8 bitmap font.
pub fn draw_bitmap_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let scale_i = scale.max(1) as i32;
    let advance = GLYPH_SIZE as i32 * scale_i;
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += advance;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (*row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale_i;
                let py = y + row_idx as i32 * scale_i;
                for sy in 0..scale_i {
                    for sx in 0..scale_i {
                        plot(img, px + sx, py + sy, color);
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

/// Pixel size of `lines` drawn with [`draw_bitmap_text`].
pub fn text_size(lines: &[String], scale: u32, line_gap: u32) -> (u32, u32) {
    let scale = scale.max(1);
    let widest = lines.iter().map(|l| l.chars().count() as u32).max().unwrap_or(0);
    let count = lines.len().max(1) as u32;
    (
        widest * GLYPH_SIZE * scale,
        count * GLYPH_SIZE * scale + (count - 1) * line_gap,
    )
}
