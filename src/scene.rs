//! Blob model: the six colored light sources driving every frame.
//!
//! A [`Scene`] always holds exactly [`BLOB_COUNT`] blobs: five ambient
//! drifters followed by one pointer-chasing interactive blob. The ordering is
//! load-bearing - palette colors are assigned by slot index, so slot 0 is
//! always the blue blob no matter what the random draws produced.

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::viewport::Viewport;

/// Number of blob slots in a scene (and in the field shader's uniform block).
pub const BLOB_COUNT: usize = 6;

/// Ambient blobs span `(width + height) * 0.2`.
pub const AMBIENT_RADIUS_FACTOR: f32 = 0.2;

/// The interactive blob is half that size.
pub const INTERACTIVE_RADIUS_FACTOR: f32 = 0.1;

/// Fixed six-entry palette, indexed by scene slot. Slots 0-4 color the
/// ambient blobs, slot 5 the interactive one.
pub const PALETTE: [Vec3; BLOB_COUNT] = [
    Vec3::new(18.0 / 255.0, 113.0 / 255.0, 255.0 / 255.0),
    Vec3::new(221.0 / 255.0, 74.0 / 255.0, 255.0 / 255.0),
    Vec3::new(100.0 / 255.0, 220.0 / 255.0, 255.0 / 255.0),
    Vec3::new(200.0 / 255.0, 50.0 / 255.0, 50.0 / 255.0),
    Vec3::new(180.0 / 255.0, 180.0 / 255.0, 50.0 / 255.0),
    Vec3::new(140.0 / 255.0, 100.0 / 255.0, 255.0 / 255.0),
];

/// Backdrop gradient start: dark purple.
pub const BACKDROP_TOP: Vec3 = Vec3::new(108.0 / 255.0, 0.0, 162.0 / 255.0);

/// Backdrop gradient end: dark blue.
pub const BACKDROP_BOTTOM: Vec3 = Vec3::new(0.0, 17.0 / 255.0, 82.0 / 255.0);

/// A soft-edged circular light source.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Position in canvas pixel coordinates, mutated every frame.
    pub position: Vec2,
    /// Footprint radius in pixels, fixed at creation.
    pub radius: f32,
    /// RGB color in 0-1, fixed at creation from [`PALETTE`].
    pub color: Vec3,
    /// Per-frame drift, fixed at creation. Zero for the interactive blob.
    pub velocity: Vec2,
    /// Whether this blob follows the pointer instead of its velocity.
    pub interactive: bool,
}

/// The ordered collection of blobs rendered each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub blobs: Vec<Blob>,
}

impl Scene {
    /// Build a fresh scene for the given viewport using the thread RNG.
    pub fn generate(viewport: &Viewport) -> Self {
        Self::generate_with(&mut rand::thread_rng(), viewport)
    }

    /// Build a fresh scene drawing all randomness from `rng`.
    ///
    /// Five ambient blobs get a uniformly random position inside the canvas
    /// and a velocity whose components are `(U(0,1) - 0.5) * speed` with a
    /// fresh `speed = U(0,1) * 4 + 1` per blob; the interactive blob starts
    /// at the center with zero velocity.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, viewport: &Viewport) -> Self {
        let ambient_radius = (viewport.width + viewport.height) * AMBIENT_RADIUS_FACTOR;

        let mut blobs: Vec<Blob> = (0..BLOB_COUNT - 1)
            .map(|slot| {
                let position = Vec2::new(
                    rng.gen::<f32>() * viewport.width,
                    rng.gen::<f32>() * viewport.height,
                );
                let speed = rng.gen::<f32>() * 4.0 + 1.0;
                let velocity = Vec2::new(
                    (rng.gen::<f32>() - 0.5) * speed,
                    (rng.gen::<f32>() - 0.5) * speed,
                );
                Blob {
                    position,
                    radius: ambient_radius,
                    color: PALETTE[slot],
                    velocity,
                    interactive: false,
                }
            })
            .collect();

        blobs.push(Blob {
            position: viewport.center(),
            radius: (viewport.width + viewport.height) * INTERACTIVE_RADIUS_FACTOR,
            color: PALETTE[BLOB_COUNT - 1],
            velocity: Vec2::ZERO,
            interactive: true,
        });

        Self { blobs }
    }

    /// The pointer-chasing blob (always the last slot).
    pub fn interactive(&self) -> &Blob {
        &self.blobs[BLOB_COUNT - 1]
    }
}
