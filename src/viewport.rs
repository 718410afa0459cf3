//! Viewport state shared by the simulation and both renderers.
//!
//! A [`Viewport`] is the single owned copy of everything the outside world
//! feeds into the effect: canvas size, last known pointer position, and the
//! theme signal. It is created once, mutated in place by the resize /
//! pointer-move / theme handlers, and passed by reference everywhere else.

use glam::Vec2;

/// Canvas dimensions, pointer position, and theme flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    /// Last known pointer position in canvas pixel coordinates.
    pub pointer: Vec2,
    /// Whether the dark theme is active.
    pub dark_mode: bool,
}

impl Viewport {
    /// Create a viewport of the given size, pointer parked at the center.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pointer: Vec2::new(width * 0.5, height * 0.5),
            dark_mode: false,
        }
    }

    /// Center of the canvas.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Update the dimensions after a resize notification.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Record a new pointer position.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }
}
