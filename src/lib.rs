//! # LuminaTree
//!
//! An interactive particle holiday tree: a spiral cone of sparkling points,
//! falling snow and a starfield, rendered with bloom and shaped live from a
//! settings panel.
//!
//! The crate splits into a pure CPU core and a desktop viewer. The core has no
//! GPU or window dependencies and is what the tests exercise.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lumina_tree::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     Viewer::new()
//!         .with_config(
//!             TreeConfig::default()
//!                 .with_tree_color(Rgb::from_hex("#ffcc33")?)
//!                 .with_particle_count(6_000),
//!         )
//!         .run()
//! }
//! ```
//!
//! ## Core
//!
//! | Piece | What it does |
//! |-------|--------------|
//! | [`TreeConfig`] | Every tunable parameter, with validation and a JSON form |
//! | [`tree::generate`] | Lays particles out along the spiral cone |
//! | [`animation::tick`] | Per-frame sparkle driver and tree rotation |
//! | [`SnowField`] | Falling flakes that wrap from floor to ceiling |
//! | [`Starfield`] | Static background shell of stars |
//! | [`Scene`] | Owns all of the above and applies configuration changes |
//!
//! Randomness is always injected, so a seeded [`rand::rngs::StdRng`] gives
//! reproducible trees:
//!
//! ```
//! use lumina_tree::{tree, TreeConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let config = TreeConfig::default().with_particle_count(500);
//! let a = tree::generate(&config, &mut StdRng::seed_from_u64(3));
//! let b = tree::generate(&config, &mut StdRng::seed_from_u64(3));
//! assert_eq!(a, b);
//! ```
//!
//! ## Viewer
//!
//! [`Viewer`] opens a window with an orbit camera (drag to rotate, scroll to
//! zoom). `H` toggles the settings panel, `R` restores the defaults and
//! `Escape` quits.

pub mod animation;
pub mod clock;
mod color;
pub mod config;
mod error;
pub mod gpu;
#[cfg(feature = "egui")]
pub mod panel;
mod scene;
pub mod snow;
pub mod stars;
pub mod tree;
mod viewer;

pub use glam::Vec3;

pub use clock::FrameClock;
pub use color::Rgb;
pub use config::{ParamRange, TreeConfig};
pub use error::{ConfigError, GpuError, ViewerError};
pub use scene::Scene;
pub use snow::SnowField;
pub use stars::{StarSettings, Starfield};
pub use tree::ParticleField;
pub use viewer::{Viewer, ViewerSettings};

/// Convenient re-exports for common usage.
///
/// ```
/// use lumina_tree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::FrameState;
    pub use crate::config::TreeConfig;
    pub use crate::error::{ConfigError, ViewerError};
    pub use crate::scene::Scene;
    pub use crate::tree::ParticleField;
    pub use crate::viewer::Viewer;
    pub use crate::{Rgb, Vec3};
    #[cfg(feature = "egui")]
    pub use egui;
}
