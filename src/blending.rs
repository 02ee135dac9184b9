//! Alpha blending math for watermark overlays.
//!
//! Watermarks are applied with the Porter-Duff "over" operator, with the
//! watermark's own alpha channel scaled by the requested opacity:
//!
//! `alpha = watermark_alpha * opacity`
//! `out = alpha * watermark + (1 - alpha) * thumbnail`
//!
//! (generalized below for thumbnails that carry their own transparency).

use image::{Rgba, RgbaImage};

/// Alpha threshold: ignore pixels with negligible watermark effect (noise).
const ALPHA_THRESHOLD: f32 = 0.002;

/// Blend `layer` onto `target` with its top-left corner at `(pos_x, pos_y)`.
///
/// The position may be negative or extend past the target; the layer is
/// clipped to the target bounds. `opacity` is clamped to `0.0..=1.0` and an
/// opacity of zero leaves the target untouched.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn blend_layer(target: &mut RgbaImage, layer: &RgbaImage, pos_x: i64, pos_y: i64, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }

    // Clip to image bounds
    let x1 = pos_x.max(0);
    let y1 = pos_y.max(0);
    let x2 = pos_x
        .saturating_add(i64::from(layer.width()))
        .min(i64::from(target.width()));
    let y2 = pos_y
        .saturating_add(i64::from(layer.height()))
        .min(i64::from(target.height()));

    if x1 >= x2 || y1 >= y2 {
        return;
    }

    for ty in y1..y2 {
        for tx in x1..x2 {
            let fg = *layer.get_pixel((tx - pos_x) as u32, (ty - pos_y) as u32);
            let fg_alpha = f32::from(fg[3]) / 255.0 * opacity;

            // Skip pixels with negligible watermark effect
            if fg_alpha < ALPHA_THRESHOLD {
                continue;
            }

            let px = target.get_pixel_mut(tx as u32, ty as u32);
            *px = blend_pixel(*px, fg, fg_alpha);
        }
    }
}

/// Blend a single foreground pixel over a background pixel.
///
/// `fg_alpha` is the effective foreground alpha, already scaled by opacity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_pixel(bg: Rgba<u8>, fg: Rgba<u8>, fg_alpha: f32) -> Rgba<u8> {
    let bg_alpha = f32::from(bg[3]) / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < ALPHA_THRESHOLD {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |f: u8, b: u8| -> u8 {
        let value =
            (f32::from(f) * fg_alpha + f32::from(b) * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(fg[0], bg[0]),
        channel(fg[1], bg[1]),
        channel(fg[2], bg[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
