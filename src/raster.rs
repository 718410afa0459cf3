//! CPU raster compositor: the draw-and-blur rendering strategy.
//!
//! Each frame runs the classic four-step pipeline over two pixel buffers:
//! fill the visible surface with the fixed backdrop gradient, stamp every
//! blob into an off-screen buffer as a radial gradient disk, gaussian-blur
//! the off-screen buffer, then composite it onto the backdrop with a
//! theme-dependent blend mode. The blur is what fuses neighbouring disks
//! into one continuous blob; the blend mode decides whether overlaps
//! brighten (light theme, lighten) or shift hue (dark theme, hue).
//!
//! Everything here is plain `f32` pixel math with no GPU dependency, so the
//! whole pipeline is unit-testable; [`crate::gpu::blit`] handles presenting
//! the finished frame.

use glam::{Vec2, Vec3};

use crate::scene::{Blob, Scene, BACKDROP_BOTTOM, BACKDROP_TOP};
use crate::viewport::Viewport;

/// Blur radius applied to the off-screen buffer in the light theme.
pub const BLUR_RADIUS_LIGHT: f32 = 80.0;

/// Blur radius applied in the dark theme.
pub const BLUR_RADIUS_DARK: f32 = 40.0;

/// Gaussian sigma per unit of blur radius (CSS convention: `blur(r)` is a
/// gaussian with standard deviation `r / 2`).
const BLUR_SIGMA_FACTOR: f32 = 0.5;

/// Blur radius for the given theme.
#[inline]
pub fn blur_radius(dark_mode: bool) -> f32 {
    if dark_mode {
        BLUR_RADIUS_DARK
    } else {
        BLUR_RADIUS_LIGHT
    }
}

/// How the blurred blob layer combines with the backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Per-channel maximum; overlaps brighten.
    Lighten,
    /// Hue of the source with saturation and luminosity of the backdrop;
    /// overlaps shift color instead of brightness.
    Hue,
}

/// Blend mode for the given theme.
#[inline]
pub fn blend_mode(dark_mode: bool) -> BlendMode {
    if dark_mode {
        BlendMode::Hue
    } else {
        BlendMode::Lighten
    }
}

/// A premultiplied-alpha RGBA `f32` pixel buffer.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Pixmap {
    /// Allocate a transparent-black buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * 4],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * 4
    }

    /// Premultiplied RGBA at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, px: [f32; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Encode as tightly packed RGBA8, clamping each channel.
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.data.len());
        for v in &self.data {
            out.push((v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
        }
    }
}

/// Step 1: fill `pixmap` with the fixed diagonal backdrop gradient, dark
/// purple at the top-left corner to dark blue at the bottom-right. Theme
/// independent and constant across runs.
pub fn fill_backdrop(pixmap: &mut Pixmap) {
    let span = (pixmap.width + pixmap.height).max(1) as f32;
    for y in 0..pixmap.height {
        for x in 0..pixmap.width {
            let t = (x + y) as f32 / span;
            let c = BACKDROP_TOP.lerp(BACKDROP_BOTTOM, t);
            pixmap.put(x, y, [c.x, c.y, c.z, 1.0]);
        }
    }
}

/// Step 2: draw one blob into the off-screen buffer as a radial gradient
/// disk - opaque blob color at the center, fully transparent at the radius -
/// composited over whatever is already there.
pub fn stamp_blob(pixmap: &mut Pixmap, blob: &Blob) {
    if blob.radius <= 0.0 {
        return;
    }
    let min_x = ((blob.position.x - blob.radius).floor().max(0.0)) as usize;
    let min_y = ((blob.position.y - blob.radius).floor().max(0.0)) as usize;
    let max_x = ((blob.position.x + blob.radius).ceil() as isize)
        .clamp(0, pixmap.width as isize) as usize;
    let max_y = ((blob.position.y + blob.radius).ceil() as isize)
        .clamp(0, pixmap.height as isize) as usize;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let dist = (Vec2::new(x as f32, y as f32) - blob.position).length();
            if dist >= blob.radius {
                continue;
            }
            let alpha = 1.0 - dist / blob.radius;
            let src = blob.color * alpha;
            let dst = pixmap.pixel(x, y);
            // Source-over in premultiplied space.
            pixmap.put(
                x,
                y,
                [
                    src.x + dst[0] * (1.0 - alpha),
                    src.y + dst[1] * (1.0 - alpha),
                    src.z + dst[2] * (1.0 - alpha),
                    alpha + dst[3] * (1.0 - alpha),
                ],
            );
        }
    }
}

/// Step 3: gaussian-blur the buffer in place.
///
/// Approximated by three successive box blurs, which converges on a true
/// gaussian (central limit) while staying O(1) per pixel per pass.
pub fn gaussian_blur(pixmap: &mut Pixmap, radius: f32) {
    let sigma = radius * BLUR_SIGMA_FACTOR;
    if sigma <= 0.0 || pixmap.width == 0 || pixmap.height == 0 {
        return;
    }
    let mut scratch = vec![0.0; pixmap.data.len()];
    for r in box_radii(sigma) {
        if r == 0 {
            continue;
        }
        box_blur_h(&pixmap.data, &mut scratch, pixmap.width, pixmap.height, r);
        box_blur_v(&scratch, &mut pixmap.data, pixmap.width, pixmap.height, r);
    }
}

/// Box radii whose triple application approximates a gaussian of the given
/// sigma (the usual ideal-width derivation over three passes).
fn box_radii(sigma: f32) -> [usize; 3] {
    let passes = 3.0f32;
    let ideal = (12.0 * sigma * sigma / passes + 1.0).sqrt();
    let mut lower = ideal.floor() as i32;
    if lower % 2 == 0 {
        lower -= 1;
    }
    let lower = lower.max(1);
    let upper = lower + 2;
    let lf = lower as f32;
    let cutoff = ((12.0 * sigma * sigma - passes * lf * lf - 4.0 * passes * lf - 3.0 * passes)
        / (-4.0 * lf - 4.0))
        .round() as i32;

    let mut radii = [0usize; 3];
    for (i, r) in radii.iter_mut().enumerate() {
        let width = if (i as i32) < cutoff { lower } else { upper };
        *r = ((width - 1) / 2).max(0) as usize;
    }
    radii
}

fn box_blur_h(src: &[f32], dst: &mut [f32], width: usize, height: usize, radius: usize) {
    let norm = 1.0 / (2 * radius + 1) as f32;
    let clamp_x = |x: isize| x.clamp(0, width as isize - 1) as usize;
    for y in 0..height {
        let row = y * width;
        let mut acc = [0.0f32; 4];
        for i in -(radius as isize)..=(radius as isize) {
            let p = (row + clamp_x(i)) * 4;
            for (a, s) in acc.iter_mut().zip(&src[p..p + 4]) {
                *a += s;
            }
        }
        for x in 0..width {
            let p = (row + x) * 4;
            for (d, a) in dst[p..p + 4].iter_mut().zip(&acc) {
                *d = a * norm;
            }
            let add = (row + clamp_x(x as isize + radius as isize + 1)) * 4;
            let sub = (row + clamp_x(x as isize - radius as isize)) * 4;
            for c in 0..4 {
                acc[c] += src[add + c] - src[sub + c];
            }
        }
    }
}

fn box_blur_v(src: &[f32], dst: &mut [f32], width: usize, height: usize, radius: usize) {
    let norm = 1.0 / (2 * radius + 1) as f32;
    let clamp_y = |y: isize| y.clamp(0, height as isize - 1) as usize;
    for x in 0..width {
        let mut acc = [0.0f32; 4];
        for i in -(radius as isize)..=(radius as isize) {
            let p = (clamp_y(i) * width + x) * 4;
            for (a, s) in acc.iter_mut().zip(&src[p..p + 4]) {
                *a += s;
            }
        }
        for y in 0..height {
            let p = (y * width + x) * 4;
            for (d, a) in dst[p..p + 4].iter_mut().zip(&acc) {
                *d = a * norm;
            }
            let add = (clamp_y(y as isize + radius as isize + 1) * width + x) * 4;
            let sub = (clamp_y(y as isize - radius as isize) * width + x) * 4;
            for c in 0..4 {
                acc[c] += src[add + c] - src[sub + c];
            }
        }
    }
}

/// Step 4: composite the blurred blob layer onto the opaque backdrop with
/// the given blend mode. The backdrop stays opaque, so the result needs no
/// further compositing state - every call starts from a clean slate.
pub fn composite(base: &mut Pixmap, overlay: &Pixmap, mode: BlendMode) {
    debug_assert_eq!(base.width, overlay.width);
    debug_assert_eq!(base.height, overlay.height);
    for y in 0..base.height {
        for x in 0..base.width {
            let over = overlay.pixel(x, y);
            let alpha = over[3];
            if alpha <= 0.0 {
                continue;
            }
            let under = base.pixel(x, y);
            let cb = Vec3::new(under[0], under[1], under[2]);
            // Un-premultiply the source before blending.
            let cs = Vec3::new(over[0], over[1], over[2]) / alpha;
            let blended = blend(cb, cs, mode);
            let out = cb.lerp(blended, alpha);
            base.put(x, y, [out.x, out.y, out.z, 1.0]);
        }
    }
}

/// Apply a blend function to backdrop and source colors (both straight,
/// non-premultiplied).
pub fn blend(cb: Vec3, cs: Vec3, mode: BlendMode) -> Vec3 {
    match mode {
        BlendMode::Lighten => cb.max(cs),
        BlendMode::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
    }
}

// Non-separable blend helpers, per the standard compositing definitions.

#[inline]
fn lum(c: Vec3) -> f32 {
    0.3 * c.x + 0.59 * c.y + 0.11 * c.z
}

#[inline]
fn sat(c: Vec3) -> f32 {
    c.max_element() - c.min_element()
}

fn clip_color(c: Vec3) -> Vec3 {
    let l = lum(c);
    let n = c.min_element();
    let x = c.max_element();
    let mut c = c;
    if n < 0.0 {
        c = Vec3::splat(l) + (c - Vec3::splat(l)) * (l / (l - n));
    }
    if x > 1.0 {
        c = Vec3::splat(l) + (c - Vec3::splat(l)) * ((1.0 - l) / (x - l));
    }
    c
}

fn set_lum(c: Vec3, l: f32) -> Vec3 {
    clip_color(c + Vec3::splat(l - lum(c)))
}

fn set_sat(c: Vec3, s: f32) -> Vec3 {
    let mut v = [c.x, c.y, c.z];
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| v[a].total_cmp(&v[b]));
    let [lo, mid, hi] = order;
    if v[hi] > v[lo] {
        v[mid] = (v[mid] - v[lo]) * s / (v[hi] - v[lo]);
        v[hi] = s;
    } else {
        v[mid] = 0.0;
        v[hi] = 0.0;
    }
    v[lo] = 0.0;
    Vec3::new(v[0], v[1], v[2])
}

/// The two drawing surfaces of the raster pipeline plus the composed frame.
#[derive(Debug)]
pub struct Compositor {
    visible: Pixmap,
    offscreen: Pixmap,
}

impl Compositor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            visible: Pixmap::new(width, height),
            offscreen: Pixmap::new(width, height),
        }
    }

    /// Drop both buffers and reallocate at the new size.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.visible = Pixmap::new(width, height);
        self.offscreen = Pixmap::new(width, height);
    }

    /// Run the full pipeline for one frame and return the visible surface.
    pub fn compose(&mut self, scene: &Scene, viewport: &Viewport) -> &Pixmap {
        fill_backdrop(&mut self.visible);

        self.offscreen.clear();
        for blob in &scene.blobs {
            stamp_blob(&mut self.offscreen, blob);
        }
        gaussian_blur(&mut self.offscreen, blur_radius(viewport.dark_mode));

        composite(
            &mut self.visible,
            &self.offscreen,
            blend_mode(viewport.dark_mode),
        );
        &self.visible
    }

    /// The most recently composed frame.
    pub fn frame(&self) -> &Pixmap {
        &self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PALETTE;

    fn blob(x: f32, y: f32, radius: f32, color: Vec3) -> Blob {
        Blob {
            position: Vec2::new(x, y),
            radius,
            color,
            velocity: Vec2::ZERO,
            interactive: false,
        }
    }

    #[test]
    fn test_theme_selects_blur_radius() {
        assert_eq!(blur_radius(false), 80.0);
        assert_eq!(blur_radius(true), 40.0);
    }

    #[test]
    fn test_theme_selects_blend_mode() {
        assert_eq!(blend_mode(false), BlendMode::Lighten);
        assert_eq!(blend_mode(true), BlendMode::Hue);
    }

    #[test]
    fn test_backdrop_corners() {
        let mut pm = Pixmap::new(64, 48);
        fill_backdrop(&mut pm);
        let tl = pm.pixel(0, 0);
        assert!((Vec3::new(tl[0], tl[1], tl[2]) - BACKDROP_TOP).length() < 1e-6);
        let br = pm.pixel(63, 47);
        let t = (63.0 + 47.0) / (64.0 + 48.0);
        let expect = BACKDROP_TOP.lerp(BACKDROP_BOTTOM, t);
        assert!((Vec3::new(br[0], br[1], br[2]) - expect).length() < 1e-6);
    }

    #[test]
    fn test_stamp_opaque_center_transparent_edge() {
        let mut pm = Pixmap::new(100, 100);
        let b = blob(50.0, 50.0, 30.0, Vec3::new(0.2, 0.4, 0.8));
        stamp_blob(&mut pm, &b);

        let center = pm.pixel(50, 50);
        assert!((center[3] - 1.0).abs() < 1e-6);
        assert!((Vec3::new(center[0], center[1], center[2]) - b.color).length() < 1e-6);

        // Alpha fades linearly with distance.
        let halfway = pm.pixel(65, 50);
        assert!((halfway[3] - 0.5).abs() < 1e-6);

        // Untouched outside the radius.
        assert_eq!(pm.pixel(85, 50), [0.0; 4]);
    }

    #[test]
    fn test_stamp_composites_over() {
        let mut pm = Pixmap::new(100, 100);
        stamp_blob(&mut pm, &blob(50.0, 50.0, 30.0, Vec3::new(1.0, 0.0, 0.0)));
        stamp_blob(&mut pm, &blob(50.0, 50.0, 30.0, Vec3::new(0.0, 1.0, 0.0)));
        // The later opaque center fully covers the earlier one.
        let center = pm.pixel(50, 50);
        assert!(center[1] > 0.99 && center[0] < 1e-6);
    }

    #[test]
    fn test_stamp_clips_to_buffer() {
        // A blob mostly off-canvas must not panic and still paints the
        // overlapping corner.
        let mut pm = Pixmap::new(64, 64);
        stamp_blob(&mut pm, &blob(-10.0, -10.0, 30.0, Vec3::ONE));
        assert!(pm.pixel(0, 0)[3] > 0.0);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let mut pm = Pixmap::new(32, 32);
        for y in 0..32 {
            for x in 0..32 {
                pm.put(x, y, [0.25, 0.5, 0.75, 1.0]);
            }
        }
        gaussian_blur(&mut pm, 12.0);
        for y in 0..32 {
            for x in 0..32 {
                let px = pm.pixel(x, y);
                assert!((px[0] - 0.25).abs() < 1e-4);
                assert!((px[1] - 0.5).abs() < 1e-4);
                assert!((px[2] - 0.75).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_blur_spreads_energy() {
        let mut pm = Pixmap::new(65, 65);
        pm.put(32, 32, [1.0, 1.0, 1.0, 1.0]);
        gaussian_blur(&mut pm, 8.0);
        // Peak drops, neighbourhood picks up.
        assert!(pm.pixel(32, 32)[3] < 1.0);
        assert!(pm.pixel(36, 32)[3] > 0.0);
        assert!(pm.pixel(32, 36)[3] > 0.0);
    }

    #[test]
    fn test_blur_zero_radius_is_noop() {
        let mut pm = Pixmap::new(16, 16);
        pm.put(8, 8, [1.0, 0.0, 0.0, 1.0]);
        let before = pm.clone();
        gaussian_blur(&mut pm, 0.0);
        assert_eq!(pm.pixel(8, 8), before.pixel(8, 8));
    }

    #[test]
    fn test_box_radii_grow_with_sigma() {
        let narrow = box_radii(5.0);
        let wide = box_radii(40.0);
        assert!(narrow.iter().sum::<usize>() < wide.iter().sum::<usize>());
    }

    #[test]
    fn test_lighten_is_channel_max() {
        let cb = Vec3::new(0.1, 0.8, 0.3);
        let cs = Vec3::new(0.5, 0.2, 0.9);
        assert_eq!(
            blend(cb, cs, BlendMode::Lighten),
            Vec3::new(0.5, 0.8, 0.9)
        );
    }

    #[test]
    fn test_hue_over_gray_stays_gray() {
        // Gray has zero saturation, so adopting its saturation and
        // luminosity erases the source entirely.
        let gray = Vec3::splat(0.5);
        let out = blend(gray, Vec3::new(1.0, 0.0, 0.0), BlendMode::Hue);
        assert!((out - gray).length() < 1e-5);
    }

    #[test]
    fn test_hue_takes_source_hue() {
        // Red over blue: red hue with blue's saturation and luminosity.
        let out = blend(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), BlendMode::Hue);
        assert!(out.x > out.y && out.x > out.z);
        assert!((lum(out) - 0.11).abs() < 1e-5);
    }

    #[test]
    fn test_hue_preserves_backdrop_luminosity() {
        let cb = Vec3::new(0.3, 0.6, 0.2);
        let cs = Vec3::new(0.9, 0.1, 0.4);
        let out = blend(cb, cs, BlendMode::Hue);
        assert!((lum(out) - lum(cb)).abs() < 1e-4);
    }

    #[test]
    fn test_composite_transparent_overlay_is_identity() {
        let mut base = Pixmap::new(32, 32);
        fill_backdrop(&mut base);
        let reference = base.clone();
        let overlay = Pixmap::new(32, 32);
        composite(&mut base, &overlay, BlendMode::Lighten);
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(base.pixel(x, y), reference.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_compose_themes_diverge() {
        // Same scene, different theme: the pipelines must pick different
        // blur radii and blend modes, and it shows in the pixels.
        let vp_light = Viewport::new(128.0, 96.0);
        let mut vp_dark = vp_light.clone();
        vp_dark.dark_mode = true;

        let scene = Scene {
            blobs: vec![blob(64.0, 48.0, 40.0, PALETTE[1])],
        };

        let mut light = Compositor::new(128, 96);
        let mut dark = Compositor::new(128, 96);
        let a = light.compose(&scene, &vp_light).clone();
        let b = dark.compose(&scene, &vp_dark).clone();

        let differs = (0..96)
            .flat_map(|y| (0..128).map(move |x| (x, y)))
            .any(|(x, y)| a.pixel(x, y) != b.pixel(x, y));
        assert!(differs);
    }

    #[test]
    fn test_compose_empty_scene_is_backdrop() {
        let vp = Viewport::new(64.0, 64.0);
        let scene = Scene { blobs: vec![] };
        let mut compositor = Compositor::new(64, 64);
        let frame = compositor.compose(&scene, &vp);

        let mut expect = Pixmap::new(64, 64);
        fill_backdrop(&mut expect);
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(frame.pixel(x, y), expect.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_write_rgba8_clamps() {
        let mut pm = Pixmap::new(1, 1);
        pm.put(0, 0, [1.5, -0.25, 0.5, 1.0]);
        let mut out = Vec::new();
        pm.write_rgba8(&mut out);
        assert_eq!(out, vec![255, 0, 128, 255]);
    }
}
