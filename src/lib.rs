//! # lavalamp - theme-aware morphing blob backgrounds
//!
//! Renders a continuously animated background of soft colored disks that
//! drift, merge, and follow the pointer. One simulation drives two
//! interchangeable rendering strategies:
//!
//! - **Raster** ([`RendererKind::Raster`]): draws each blob as a radial
//!   gradient into an off-screen buffer, gaussian-blurs it, and composites
//!   it onto a fixed backdrop gradient with a theme-dependent blend mode
//!   (lighten in light theme, hue in dark theme).
//! - **Field** ([`RendererKind::Field`]): evaluates a closed-form gaussian
//!   density field per pixel in a single fullscreen GPU pass, resolving a
//!   density-weighted color average so overlapping blobs blend toward a
//!   mixed hue instead of saturating.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lavalamp::{Background, RendererKind};
//!
//! fn main() -> Result<(), lavalamp::AppError> {
//!     env_logger::init();
//!     Background::new()
//!         .with_renderer(RendererKind::Field)
//!         .run()
//! }
//! ```
//!
//! ## Structure
//!
//! The simulation ([`scene`], [`sim`], [`Viewport`]) is plain data and pure
//! mutation, shared read-only by both renderers. The field formula exists
//! twice: as testable Rust in [`field`] and as WGSL inside the GPU pass
//! that mirrors it. The raster pipeline ([`raster`]) is entirely CPU-side
//! pixel math; the GPU only presents its finished frames.
//!
//! The effect is a decorative layer: if the host has no usable GPU backend
//! the application logs one diagnostic and declines to start, it never
//! panics the surrounding process.

mod app;
mod clock;
mod error;
pub mod field;
pub mod gpu;
pub mod raster;
mod renderer;
pub mod scene;
pub mod sim;
mod viewport;

pub use app::Background;
pub use clock::FrameClock;
pub use error::{AppError, GpuError};
pub use glam::{Vec2, Vec3};
pub use gpu::GpuContext;
pub use renderer::{FieldRenderer, RasterRenderer, Renderer, RendererKind};
pub use scene::{Blob, Scene, BLOB_COUNT, PALETTE};
pub use viewport::Viewport;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::app::Background;
    pub use crate::clock::FrameClock;
    pub use crate::error::{AppError, GpuError};
    pub use crate::renderer::RendererKind;
    pub use crate::scene::{Blob, Scene};
    pub use crate::sim::advance;
    pub use crate::viewport::Viewport;
    pub use crate::{Vec2, Vec3};
}
