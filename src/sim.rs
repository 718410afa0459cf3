//! Per-frame blob kinematics, shared by both renderers.
//!
//! One [`advance`] call moves every blob by one frame: ambient blobs drift
//! and wrap toroidally, the interactive blob eases toward the pointer. The
//! step is deterministic given the current state and pointer position, which
//! is what makes the invariants below testable without a window.

use crate::scene::Scene;
use crate::viewport::Viewport;

/// Fraction of the remaining pointer distance covered per step.
pub const POINTER_EASE: f32 = 0.1;

/// Advance every blob by one frame.
pub fn advance(scene: &mut Scene, viewport: &Viewport) {
    for blob in &mut scene.blobs {
        if blob.interactive {
            // First-order lag toward the pointer value read right now, not
            // one captured at scene creation.
            blob.position += (viewport.pointer - blob.position) * POINTER_EASE;
        } else {
            blob.position += blob.velocity;
            blob.position.x = wrap_axis(blob.position.x, blob.radius, viewport.width);
            blob.position.y = wrap_axis(blob.position.y, blob.radius, viewport.height);
        }
    }
}

/// Toroidal wrap along one axis.
///
/// The blob teleports only once its soft-edged footprint has fully left the
/// canvas (`pos - radius > extent` or `pos + radius < 0`), reappearing just
/// past the opposite edge so the transition is never visible.
fn wrap_axis(pos: f32, radius: f32, extent: f32) -> f32 {
    if pos - radius > extent {
        -radius
    } else if pos + radius < 0.0 {
        extent + radius
    } else {
        pos
    }
}
