//! Spiral cone particle field.
//!
//! [`generate`] lays particles out in index order along a spiral that winds
//! from the base of a cone to its apex, jitters them by the configured
//! randomness and fades their color toward white near the top.
//!
//! ```
//! use lumina_tree::{tree, TreeConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let field = tree::generate(&TreeConfig::default(), &mut rng);
//! assert_eq!(field.len(), 3000);
//! ```

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;

use crate::color::Rgb;
use crate::config::TreeConfig;

/// Smallest horizontal distance a particle may have from the trunk axis.
pub const MIN_RADIUS: f32 = 0.1;

/// Upper bound of the whitening factor, reached at the apex.
pub const MAX_WHITENING: f32 = 0.5;

/// Per-particle data for the tree's point cloud.
///
/// The three sequences are index-aligned and always the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleField {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub phases: Vec<f32>,
}

/// Interleaved vertex layout uploaded to the GPU, one instance per particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TreeVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub phase: f32,
}

impl ParticleField {
    fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
            phases: Vec::with_capacity(count),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions as a flat `[x0, y0, z0, x1, ...]` slice.
    pub fn position_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as a flat `[r0, g0, b0, r1, ...]` slice.
    pub fn color_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn phase_buffer(&self) -> &[f32] {
        &self.phases
    }

    pub fn vertices(&self) -> Vec<TreeVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .zip(&self.phases)
            .map(|((p, c), &phase)| TreeVertex {
                position: p.to_array(),
                color: c.to_array(),
                phase,
            })
            .collect()
    }
}

/// Fraction of white mixed into the base color at normalized height `h_norm`.
///
/// Cubic, so the whitening is concentrated in the top third of the tree.
#[inline]
pub fn whitening_factor(h_norm: f32) -> f32 {
    h_norm.powi(3) * MAX_WHITENING
}

/// Color of a particle at normalized height `h_norm`.
#[inline]
pub fn color_at_height(base: Rgb, h_norm: f32) -> Rgb {
    base.lerp(Rgb::WHITE, whitening_factor(h_norm))
}

/// Build a fresh particle field for `config`.
///
/// Draws four values from `rng` per particle, in order: radius jitter,
/// angle jitter, vertical jitter, sparkle phase. The config must have passed
/// [`TreeConfig::validate`]; a count of zero yields an empty field.
pub fn generate<R: Rng + ?Sized>(config: &TreeConfig, rng: &mut R) -> ParticleField {
    debug_assert!(config.tree_height > 0.0, "tree height must be validated");

    let count = config.particle_count as usize;
    let mut field = ParticleField::with_capacity(count);
    if count == 0 {
        return field;
    }

    let height = config.tree_height;
    let half_height = height / 2.0;

    for i in 0..count {
        let progress = i as f32 / count as f32;
        let y = progress * height - half_height;
        let h_norm = (y + half_height) / height;

        let radius_at_height = config.base_radius * (1.0 - h_norm);
        let angle = progress * TAU * config.spiral_turns;

        let radius_jitter = (rng.gen::<f32>() - 0.5) * config.randomness * radius_at_height;
        let angle_jitter = (rng.gen::<f32>() - 0.5) * config.randomness * 2.0;
        let vertical_jitter = (rng.gen::<f32>() - 0.5) * config.randomness * 0.5;

        let r = (radius_at_height + radius_jitter).max(MIN_RADIUS);
        let theta = angle + angle_jitter;

        field
            .positions
            .push(Vec3::new(r * theta.cos(), y + vertical_jitter, r * theta.sin()));
        field.phases.push(rng.gen::<f32>());
        field
            .colors
            .push(color_at_height(config.tree_color, h_norm).into());
    }

    field
}
