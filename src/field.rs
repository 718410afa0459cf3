//! Closed-form density-field shading math.
//!
//! This is the reference implementation of the field renderer's per-pixel
//! formula: a gaussian falloff kernel per blob, accumulated into a scalar
//! density and a density-weighted color average, shaped by a nonlinear
//! intensity curve and mixed against the backdrop gradient. The WGSL in
//! [`crate::gpu::field_gpu`] mirrors these functions operation for
//! operation; keep the two in sync.
//!
//! The weighted *average* is the part that makes overlaps look like a lava
//! lamp instead of a lightbulb: two blobs meeting blend toward a mixed hue
//! rather than saturating to white.

use glam::{Vec2, Vec3};

use crate::scene::{Scene, BACKDROP_BOTTOM, BACKDROP_TOP, BLOB_COUNT};
use crate::viewport::Viewport;

/// Gaussian sigma as a fraction of blob radius.
pub const SIGMA_FACTOR: f32 = 0.5;

/// Exponent shaping how sharply overlap regions pop.
pub const INTENSITY_EXPONENT: f32 = 1.4;

/// One shader-side blob slot: position, radius, color.
///
/// Unused slots are all-zero; a zero radius contributes nothing to the
/// field, so padding never perturbs the visible result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlobSlot {
    pub position: Vec2,
    pub radius: f32,
    pub color: Vec3,
}

/// Pack a scene into the fixed six-slot uniform layout, zero-padding any
/// slots past the end of the scene.
pub fn pack_slots(scene: &Scene) -> [BlobSlot; BLOB_COUNT] {
    let mut slots = [BlobSlot::default(); BLOB_COUNT];
    for (slot, blob) in slots.iter_mut().zip(&scene.blobs) {
        *slot = BlobSlot {
            position: blob.position,
            radius: blob.radius,
            color: blob.color,
        };
    }
    slots
}

/// Gaussian falloff of a blob at distance `dist`: `exp(-d^2 / (2 sigma^2))`
/// with `sigma = radius * SIGMA_FACTOR`. Non-positive radii (padding slots)
/// contribute exactly zero.
#[inline]
pub fn falloff(dist: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let sigma = radius * SIGMA_FACTOR;
    (-dist * dist / (2.0 * sigma * sigma)).exp()
}

/// Backdrop gradient sampled at pixel `st`: vertical interpolation between
/// the fixed purple and blue endpoints.
#[inline]
pub fn backdrop_at(st: Vec2, viewport: &Viewport) -> Vec3 {
    BACKDROP_TOP.lerp(BACKDROP_BOTTOM, st.y / viewport.height)
}

/// Evaluate the full field formula at pixel `st`.
///
/// Accumulates density and weighted color over all six slots, resolves the
/// blob color as a weighted average, shapes the density into an intensity,
/// and mixes against the backdrop. The dark-theme arm currently computes the
/// same expression as the light one; it is kept as a separate branch so the
/// two can be tuned independently.
pub fn shade(st: Vec2, slots: &[BlobSlot; BLOB_COUNT], viewport: &Viewport) -> Vec3 {
    let background = backdrop_at(st, viewport);

    let mut field_sum = 0.0f32;
    let mut weighted_color = Vec3::ZERO;
    for slot in slots {
        let value = falloff((st - slot.position).length(), slot.radius);
        field_sum += value;
        weighted_color += slot.color * value;
    }

    let resolved = if field_sum > 0.0 {
        weighted_color / field_sum
    } else {
        Vec3::ZERO
    };

    let intensity = field_sum.powf(INTENSITY_EXPONENT).clamp(0.0, 1.0);

    if viewport.dark_mode {
        // Extension point: tuned independently of the light arm. Today it
        // evaluates to the same image.
        background + (resolved - background) * intensity
    } else {
        background.lerp(resolved, intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Blob, PALETTE};

    fn blob(x: f32, y: f32, radius: f32, color: Vec3) -> Blob {
        Blob {
            position: Vec2::new(x, y),
            radius,
            color,
            velocity: Vec2::ZERO,
            interactive: false,
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    #[test]
    fn test_falloff_at_center_is_one() {
        assert_eq!(falloff(0.0, 100.0), 1.0);
    }

    #[test]
    fn test_falloff_monotonically_decreasing() {
        let mut prev = falloff(0.0, 100.0);
        for step in 1..50 {
            let next = falloff(step as f32 * 10.0, 100.0);
            assert!(next < prev);
            prev = next;
        }
    }

    #[test]
    fn test_falloff_zero_radius_contributes_nothing() {
        assert_eq!(falloff(0.0, 0.0), 0.0);
        assert_eq!(falloff(123.0, 0.0), 0.0);
    }

    #[test]
    fn test_equidistant_blobs_average_exactly() {
        // Two equal-radius blobs at equal distance from the sample point
        // resolve to exactly (c1 + c2) / 2, whatever the absolute density.
        let c1 = Vec3::new(1.0, 0.0, 0.0);
        let c2 = Vec3::new(0.0, 0.0, 1.0);
        for radius in [40.0, 150.0, 400.0] {
            let scene = Scene {
                blobs: vec![
                    blob(100.0, 300.0, radius, c1),
                    blob(700.0, 300.0, radius, c2),
                ],
            };
            let slots = pack_slots(&scene);
            let st = Vec2::new(400.0, 300.0);

            let mut field_sum = 0.0;
            let mut weighted = Vec3::ZERO;
            for slot in &slots {
                let v = falloff((st - slot.position).length(), slot.radius);
                field_sum += v;
                weighted += slot.color * v;
            }
            assert!(field_sum > 0.0);
            let resolved = weighted / field_sum;
            assert!((resolved - (c1 + c2) * 0.5).length() < 1e-6);
        }
    }

    #[test]
    fn test_padding_slots_do_not_perturb() {
        // A two-blob scene shades identically with and without the four
        // zero padding slots at every sampled point.
        let scene = Scene {
            blobs: vec![
                blob(200.0, 200.0, 120.0, PALETTE[0]),
                blob(500.0, 400.0, 120.0, PALETTE[1]),
            ],
        };
        let padded = pack_slots(&scene);
        let mut bare = [BlobSlot::default(); BLOB_COUNT];
        bare[0] = padded[0];
        bare[1] = padded[1];
        // Park the padding on-canvas with zero radius to prove the guard is
        // on radius, not on position.
        for slot in bare.iter_mut().skip(2) {
            slot.position = Vec2::new(400.0, 300.0);
        }

        let vp = viewport();
        for y in (0..600).step_by(37) {
            for x in (0..800).step_by(41) {
                let st = Vec2::new(x as f32, y as f32);
                assert_eq!(shade(st, &padded, &vp), shade(st, &bare, &vp));
            }
        }
    }

    #[test]
    fn test_far_from_all_blobs_is_backdrop() {
        let scene = Scene {
            blobs: vec![blob(-1.0e6, -1.0e6, 10.0, PALETTE[0])],
        };
        let slots = pack_slots(&scene);
        let vp = viewport();
        let st = Vec2::new(400.0, 300.0);
        assert_eq!(shade(st, &slots, &vp), backdrop_at(st, &vp));
    }

    #[test]
    fn test_backdrop_endpoints() {
        let vp = viewport();
        assert_eq!(backdrop_at(Vec2::new(0.0, 0.0), &vp), BACKDROP_TOP);
        let bottom = backdrop_at(Vec2::new(0.0, 600.0), &vp);
        assert!((bottom - BACKDROP_BOTTOM).length() < 1e-6);
    }

    #[test]
    fn test_intensity_saturates_at_blob_center() {
        // On top of a healthy blob the density is >= 1, so the shaped
        // intensity clamps and the pixel shows the resolved color alone.
        let scene = Scene {
            blobs: vec![blob(400.0, 300.0, 200.0, PALETTE[2])],
        };
        let slots = pack_slots(&scene);
        let vp = viewport();
        let out = shade(Vec2::new(400.0, 300.0), &slots, &vp);
        assert!((out - PALETTE[2]).length() < 1e-6);
    }

    #[test]
    fn test_theme_arms_currently_coincide() {
        // The dark branch is a live extension point; today both arms must
        // produce the same image for the same scene.
        let vp_light = viewport();
        let mut vp_dark = viewport();
        vp_dark.dark_mode = true;

        let scene = Scene {
            blobs: vec![
                blob(300.0, 200.0, 150.0, PALETTE[0]),
                blob(450.0, 350.0, 150.0, PALETTE[3]),
            ],
        };
        let slots = pack_slots(&scene);
        for y in (0..600).step_by(53) {
            for x in (0..800).step_by(59) {
                let st = Vec2::new(x as f32, y as f32);
                let light = shade(st, &slots, &vp_light);
                let dark = shade(st, &slots, &vp_dark);
                assert!((light - dark).length() < 1e-6);
            }
        }
    }

    #[test]
    fn test_pack_slots_pads_with_zeros() {
        let scene = Scene {
            blobs: vec![blob(10.0, 10.0, 50.0, PALETTE[0])],
        };
        let slots = pack_slots(&scene);
        assert_eq!(slots[0].radius, 50.0);
        for slot in &slots[1..] {
            assert_eq!(*slot, BlobSlot::default());
        }
    }
}
